use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::attachment::{AttachmentKind, DataUri};

/// Capability for turning a user-selected file into an embeddable payload.
/// The board awaits the encoded result before attaching it to a request.
pub trait FileEncoder {
    fn encode(&self, kind: AttachmentKind, bytes: &[u8]) -> DataUri;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Base64FileEncoder;

impl FileEncoder for Base64FileEncoder {
    fn encode(&self, kind: AttachmentKind, bytes: &[u8]) -> DataUri {
        DataUri::new(format!("data:{};base64,{}", kind.mime(), STANDARD.encode(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Base64FileEncoder, FileEncoder};
    use crate::domain::attachment::AttachmentKind;

    #[test]
    fn encodes_pdf_bytes_as_data_uri() {
        let uri = Base64FileEncoder.encode(AttachmentKind::Pdf, b"%PDF-1.4");
        assert!(uri.as_str().starts_with("data:application/pdf;base64,"));
        assert_eq!(uri.kind(), Some(AttachmentKind::Pdf));
    }

    #[test]
    fn encodes_png_bytes_with_image_mime() {
        let uri = Base64FileEncoder.encode(AttachmentKind::Png, &[0x89, 0x50, 0x4e, 0x47]);
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(uri.kind(), Some(AttachmentKind::Png));
    }

    #[test]
    fn empty_payload_still_produces_well_formed_uri() {
        let uri = Base64FileEncoder.encode(AttachmentKind::Png, &[]);
        assert_eq!(uri.as_str(), "data:image/png;base64,");
    }
}
