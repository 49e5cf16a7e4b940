use reqwest::ClientBuilder as ReqwestBuilder;

/// Certificate verification policy for HTTPS targets
///
/// Verification is on unless a caller explicitly opts out for a call; the
/// insecure mode only ever applies to the transport built for that option
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TlsMode {
    /// Verify server certificates against the bundled roots
    #[default]
    Verify,
    /// Accept any server certificate
    Insecure,
}

impl TlsMode {
    /// `Insecure` when `insecure` is set
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure {
            TlsMode::Insecure
        } else {
            TlsMode::Verify
        }
    }

    /// Check if certificate verification is enabled
    pub fn is_verify_enabled(&self) -> bool {
        matches!(self, TlsMode::Verify)
    }

    /// Apply this mode to a reqwest client builder
    pub fn apply_to_builder(self, builder: ReqwestBuilder) -> ReqwestBuilder {
        let builder = builder.use_rustls_tls();
        match self {
            TlsMode::Verify => builder,
            TlsMode::Insecure => builder.danger_accept_invalid_certs(true),
        }
    }
}
