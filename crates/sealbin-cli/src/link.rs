//! Share-link construction and parsing.
//!
//! Links look like `https://host/view?p=<id>#<saltB64>:<ivB64>`. Everything
//! after `#` is a URL fragment: browsers and compliant clients never send it
//! over the wire, so the salt (and with it the decryption key) stays with
//! whoever holds the link. Parsing here must never be "forgiving" about the
//! fragment — a link whose secret half is malformed is useless, not
//! almost-right.

use sealbin_core::encoding;
use sealbin_crypto::{IV_SIZE, SALT_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("share link has no #fragment; the salt travels only there")]
    MissingFragment,

    #[error("share link has no p=<id> query parameter")]
    MissingId,

    #[error("share link fragment is not <saltB64>:<ivB64>")]
    MalformedFragment,

    #[error("share link fragment is not valid base64url: {0}")]
    Encoding(#[from] encoding::DecodeError),

    #[error("share link {part} has the wrong length: got {got}, want {want}")]
    WrongLength {
        part: &'static str,
        got: usize,
        want: usize,
    },
}

/// A parsed share link: the server-visible id plus the client-only secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub id: String,
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
}

impl ShareLink {
    /// Render as a full URL under `base` (e.g. `http://127.0.0.1:8300`).
    pub fn to_url(&self, base: &str) -> String {
        format!(
            "{}/view?p={}#{}:{}",
            base.trim_end_matches('/'),
            self.id,
            encoding::encode(&self.salt),
            encoding::encode(&self.iv),
        )
    }

    /// Parse a share link or bare `view?p=...#...` suffix.
    pub fn parse(link: &str) -> Result<Self, LinkError> {
        let (head, fragment) = link.split_once('#').ok_or(LinkError::MissingFragment)?;

        let query = head.split_once('?').map(|(_, q)| q).unwrap_or("");
        let id = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("p="))
            .filter(|id| !id.is_empty())
            .ok_or(LinkError::MissingId)?;

        let (salt_b64, iv_b64) = fragment
            .split_once(':')
            .ok_or(LinkError::MalformedFragment)?;

        let salt = fixed::<SALT_SIZE>("salt", &encoding::decode(salt_b64)?)?;
        let iv = fixed::<IV_SIZE>("iv", &encoding::decode(iv_b64)?)?;

        Ok(Self {
            id: id.to_string(),
            salt,
            iv,
        })
    }
}

fn fixed<const N: usize>(part: &'static str, bytes: &[u8]) -> Result<[u8; N], LinkError> {
    bytes.try_into().map_err(|_| LinkError::WrongLength {
        part,
        got: bytes.len(),
        want: N,
    })
}
