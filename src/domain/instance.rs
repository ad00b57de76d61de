use serde::{Deserialize, Serialize};

/// Virtual-machine instance as listed by the cloud API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub size_alias: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub state: String,
}

impl Instance {
    pub fn new(name: impl Into<String>, size_alias: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            size_alias: size_alias.into(),
            ip_address: None,
            state: state.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Suspended and stopped instances do not consume quota
    pub fn is_active(&self) -> bool {
        !matches!(self.state.as_str(), "suspended" | "stopped")
    }
}

/// Instance size (flavor) offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSize {
    pub alias: String,
    #[serde(default)]
    pub name: Option<String>,
    pub cpu: f64,
    /// Memory in MB
    pub mem: f64,
}

impl InstanceSize {
    pub fn new(alias: impl Into<String>, cpu: f64, mem: f64) -> Self {
        Self {
            alias: alias.into(),
            name: None,
            cpu,
            mem,
        }
    }
}

/// First size whose alias matches
pub fn find_size<'a>(sizes: &'a [InstanceSize], alias: &str) -> Option<&'a InstanceSize> {
    sizes.iter().find(|size| size.alias == alias)
}

/// Row of the instance table in an identity summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRow {
    pub name: String,
    pub size: String,
    pub ip_address: String,
}

impl From<&Instance> for InstanceRow {
    fn from(instance: &Instance) -> Self {
        Self {
            name: instance.name.clone(),
            size: instance.size_alias.clone(),
            ip_address: instance.ip_address.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_states() {
        assert!(Instance::new("a", "small", "active").is_active());
        assert!(Instance::new("b", "small", "build").is_active());
        assert!(!Instance::new("c", "small", "suspended").is_active());
        assert!(!Instance::new("d", "small", "stopped").is_active());
    }

    #[test]
    fn test_find_size_takes_first_match() {
        let sizes = vec![
            InstanceSize::new("small", 1.0, 2048.0),
            InstanceSize::new("small", 2.0, 4096.0),
        ];
        assert_eq!(find_size(&sizes, "small").unwrap().cpu, 1.0);
        assert!(find_size(&sizes, "large").is_none());
    }

    #[test]
    fn test_instance_deserializes_with_missing_optionals() {
        let json = r#"{"name": "web", "size_alias": "m1.small", "state": "active"}"#;
        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.size_alias, "m1.small");
        assert!(instance.ip_address.is_none());
        assert_eq!(InstanceRow::from(&instance).ip_address, "");
    }
}
