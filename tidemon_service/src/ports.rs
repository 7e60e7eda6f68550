/// Port registry for the tide and weather collector.
///
/// Defines the ports visited by a collection run, in visiting order, with
/// the station ids used in the tabular exports. The built-in list covers the
/// Brazilian ports of interest; a `[[ports]]` list in the config file
/// replaces it entirely.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::model::ConfigError;

/// Site root for Brazilian port pages.
pub const SITE_ROOT: &str = "https://tabuademares.com/br";

// ---------------------------------------------------------------------------
// Port metadata
// ---------------------------------------------------------------------------

/// One port: its station id, display name and page root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Port {
    /// Station id used in exports (`BR_PNG`).
    pub id: String,
    /// Display name (`Paranaguá`).
    pub name: String,
    /// Page root without trailing slash; forecast pages hang below it.
    pub base_url: String,
}

impl Port {
    pub fn new(id: &str, name: &str, base_url: &str) -> Self {
        Port {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of a forecast page below this port, e.g. `previsao/mares`.
    pub fn stage_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Built-in ports as (id, name, site path), south to north.
static DEFAULT_PORTS: &[(&str, &str, &str)] = &[
    ("BR_RIG", "Rio Grande", "rio-grande-do-sul/porto-do-rio-grande"),
    ("BR_PNG", "Paranaguá", "parana/paranagua"),
    ("BR_SFS", "São Francisco do Sul", "santa-catarina/sao-francisco-do-sul"),
    ("BR_ITJ", "Itajaí", "santa-catarina/itajai"),
    ("BR_IMB", "Imbituba", "santa-catarina/imbituba"),
    ("BR_STS", "Santos", "sao-paulo/santos"),
    ("BR_SSB", "São Sebastião", "sao-paulo/sao-sebastiao"),
    ("BR_RIO", "Rio de Janeiro", "rio-de-janeiro/rio-de-janeiro"),
    ("BR_SEP", "Sepetiba", "rio-de-janeiro/itaguai"),
    ("BR_VIT", "Vitória", "espirito-santo/vitoria"),
    ("BR_SAL", "Salvador", "bahia/salvador"),
    ("BR_REC", "Recife", "pernambuco/recife"),
    ("BR_SUA", "Suape", "pernambuco/porto-de-suape"),
    ("BR_FOR", "Fortaleza", "ceara/fortaleza"),
    ("BR_BEL", "Belém", "para/belem"),
    ("BR_VDC", "Vila do Conde", "para/vila-do-conde"),
    ("BR_ITQ", "Itaqui", "maranhao/porto-do-itaqui"),
    ("BR_STN", "Santana (Macapá)", "amapa/santana"),
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered, validated set of ports. Run output follows this order.
#[derive(Debug, Clone, PartialEq)]
pub struct PortRegistry {
    ports: Vec<Port>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    ports: Vec<Port>,
}

impl PortRegistry {
    /// Builds a registry, rejecting duplicate ids, blank names and
    /// non-HTTP base URLs.
    pub fn new(ports: Vec<Port>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(ports.len());

        for port in ports {
            let port = Port::new(port.id.trim(), port.name.trim(), port.base_url.trim());
            if port.id.is_empty() {
                return Err(ConfigError::Invalid("port with empty id".to_string()));
            }
            if !seen.insert(port.id.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate port id '{}'", port.id)));
            }
            if port.name.is_empty() {
                return Err(ConfigError::Invalid(format!("port '{}' has an empty name", port.id)));
            }
            if !(port.base_url.starts_with("https://") || port.base_url.starts_with("http://")) {
                return Err(ConfigError::Invalid(format!(
                    "port '{}' base_url must be http(s), got '{}'",
                    port.id, port.base_url
                )));
            }
            validated.push(port);
        }

        Ok(PortRegistry { ports: validated })
    }

    /// Reads the `[[ports]]` tables of a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::new(file.ports)
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Find a port by its station id.
    pub fn find(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Every station id, in registry order.
    pub fn ids(&self) -> Vec<&str> {
        self.ports.iter().map(|p| p.id.as_str()).collect()
    }

    /// Keeps only the listed ids, preserving registry order.
    ///
    /// Unknown ids are an error rather than silently producing an empty run.
    pub fn retain_ids(&self, ids: &[String]) -> Result<Self, ConfigError> {
        if let Some(unknown) = ids.iter().find(|id| self.find(id).is_none()) {
            return Err(ConfigError::Invalid(format!("unknown port id '{}'", unknown)));
        }
        Ok(PortRegistry {
            ports: self.ports.iter().filter(|p| ids.contains(&p.id)).cloned().collect(),
        })
    }
}

/// The built-in Brazilian port list.
pub fn default_registry() -> PortRegistry {
    PortRegistry {
        ports: DEFAULT_PORTS
            .iter()
            .map(|(id, name, path)| Port::new(id, name, &format!("{}/{}", SITE_ROOT, path)))
            .collect(),
    }
}

/// Loads the registry from a TOML file's `[[ports]]` tables.
pub fn load_registry(path: &Path) -> Result<PortRegistry, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
    PortRegistry::from_toml_str(&raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
