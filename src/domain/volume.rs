use serde::{Deserialize, Deserializer, Serialize};

/// Block-storage volume as listed by the cloud API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Capacity in GB
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub size: f64,
    #[serde(default)]
    pub status: String,
}

impl Volume {
    pub fn new(id: impl Into<String>, size: f64, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            size,
            status: status.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name when set and non-empty, otherwise the id
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }

    pub fn attachment(&self) -> Attachment {
        if self.status == "in-use" {
            Attachment::Attached
        } else {
            Attachment::Available
        }
    }
}

/// Some deployments serialise sizes as strings
fn number_or_numeric_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(f64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    Attached,
    Available,
}

/// Row of the volume table in an identity summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeRow {
    pub name: String,
    pub capacity: String,
    pub status: Attachment,
}

impl From<&Volume> for VolumeRow {
    fn from(volume: &Volume) -> Self {
        Self {
            name: volume.display_name().to_string(),
            capacity: format!("{} GB", volume.size),
            status: volume.attachment(),
        }
    }
}
