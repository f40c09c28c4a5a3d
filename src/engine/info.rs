//! Info sub-protocol
//!
//! Static cluster metadata answering the client's topology handshake. The
//! node presents itself as a single-node cluster that owns every partition of
//! every configured namespace.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::protocol::MessageWriter;

pub const NODE_NAME: &str = "BB9E152A39B2100";
pub const SERVER_VERSION: &str = "Aerospike Enterprise Edition 3.5.14";
pub const FEATURES: &str =
    "peers;cdt-list;cdt-map;pipelining;geo;float;batch-index;replicas-all;replicas-master;replicas-prole;udf;";

/// Partitions per namespace
pub const PARTITIONS: usize = 4096;

/// Named info values
#[derive(Debug, Clone)]
pub struct InfoTable {
    entries: BTreeMap<&'static str, String>,
}

impl InfoTable {
    pub fn from_config(config: &Config) -> Self {
        let service = config.advertised_service().to_string();
        let bitmap = partition_bitmap();
        let replicas = config
            .namespaces
            .iter()
            .map(|ns| format!("{}:1,{}", ns, bitmap))
            .collect::<Vec<_>>()
            .join(",");

        let mut entries = BTreeMap::new();
        entries.insert("node", NODE_NAME.to_string());
        entries.insert("partition-generation", "1".to_string());
        entries.insert("features", FEATURES.to_string());
        entries.insert("service", service.clone());
        entries.insert("services", service.clone());
        entries.insert("service-clear-std", service);
        entries.insert("peers-generation", "1".to_string());
        entries.insert("peers-clear-std", "1,,[]".to_string());
        entries.insert("replicas-all", replicas);
        entries.insert("version", SERVER_VERSION.to_string());
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Answer a newline-separated list of names. Unknown names are skipped;
    /// a request naming nothing gets every entry.
    pub fn respond(&self, request: &[u8], writer: &mut MessageWriter) {
        let names: Vec<&[u8]> = request
            .split(|&b| b == b'\n')
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            for (name, value) in &self.entries {
                writer.write_info_line(name, value.as_bytes());
            }
            return;
        }

        for raw in names {
            let value = std::str::from_utf8(raw)
                .ok()
                .and_then(|name| self.entries.get_key_value(name));
            match value {
                Some((name, value)) => writer.write_info_line(name, value.as_bytes()),
                None => tracing::trace!("Unknown info name {:?}", String::from_utf8_lossy(raw)),
            }
        }
    }
}

/// Base64 of a bitmap with one set bit per partition
fn partition_bitmap() -> String {
    // 4096 bits = 512 bytes of 0xFF = 170 groups of "////" plus "//8="
    const BYTES: usize = PARTITIONS / 8;
    let mut encoded = "////".repeat(BYTES / 3);
    encoded.push_str("//8=");
    encoded
}
