use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Pdf,
    Png,
}

impl AttachmentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            // The sheet schema stored the image slot under the generic label.
            "png" | "image" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "image",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
        }
    }
}

/// Inline-encoded file payload (`data:<mime>;base64,...`), renderable without
/// a separate fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUri(String);

impl DataUri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Detects the slot kind from the embedded mime type, if recognisable.
    pub fn kind(&self) -> Option<AttachmentKind> {
        let mime = self.0.strip_prefix("data:")?.split(';').next()?;
        match mime {
            "application/pdf" => Some(AttachmentKind::Pdf),
            "image/png" => Some(AttachmentKind::Png),
            _ => None,
        }
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.0
    }
}

/// One file per slot; selecting a new file replaces the slot wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub data: DataUri,
}

#[cfg(test)]
mod tests {
    use super::{AttachmentKind, DataUri};

    #[test]
    fn kind_parses_both_wire_labels_for_images() {
        assert_eq!(AttachmentKind::parse("image"), Some(AttachmentKind::Png));
        assert_eq!(AttachmentKind::parse("png"), Some(AttachmentKind::Png));
        assert_eq!(AttachmentKind::parse("pdf"), Some(AttachmentKind::Pdf));
        assert_eq!(AttachmentKind::parse("docx"), None);
    }

    #[test]
    fn data_uri_exposes_embedded_kind() {
        let uri = DataUri::new("data:application/pdf;base64,AAAA");
        assert_eq!(uri.kind(), Some(AttachmentKind::Pdf));

        let uri = DataUri::new("data:image/png;base64,AAAA");
        assert_eq!(uri.kind(), Some(AttachmentKind::Png));

        let uri = DataUri::new("not a data uri");
        assert_eq!(uri.kind(), None);
    }
}
