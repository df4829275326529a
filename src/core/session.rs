//! Per-invocation decode context.

use std::collections::HashSet;

use super::config::DecodeConfig;
use crate::archive::{Archive, SignatureVerifier};
use crate::codec::direction::{DirectionCache, DirectionTable};
use crate::codec::keyframe::decode_ticks;
use crate::util::{Element, Quat, Result};

/// State owned by one decode of one archive.
///
/// Holds the configuration, the direction-table memo and the set of
/// warnings already emitted. Create one per archive decode and drop it
/// afterwards; it is not meant to be shared between threads.
#[derive(Debug)]
pub struct DecodeSession {
    config: DecodeConfig,
    table: DirectionTable,
    directions: DirectionCache,
    verifier: SignatureVerifier,
    warned: HashSet<String>,
}

impl Default for DecodeSession {
    fn default() -> Self {
        Self::new(DecodeConfig::default())
    }
}

impl DecodeSession {
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            table: config.direction_table(),
            verifier: config.verifier(),
            config,
            directions: DirectionCache::new(),
            warned: HashSet::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    #[inline]
    pub fn direction_table(&self) -> &DirectionTable {
        &self.table
    }

    #[inline]
    pub fn direction_cache(&self) -> &DirectionCache {
        &self.directions
    }

    #[inline]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    /// Log `message` at warn level the first time `key` is seen.
    ///
    /// Returns `true` if the warning was emitted.
    pub fn warn_once(&mut self, key: &str, message: impl FnOnce() -> String) -> bool {
        if self.warned.contains(key) {
            tracing::trace!(key, "repeated warning suppressed");
            return false;
        }
        self.warned.insert(key.to_string());
        tracing::warn!("{}", message());
        true
    }

    /// Number of distinct warnings emitted so far.
    #[inline]
    pub fn warning_count(&self) -> usize {
        self.warned.len()
    }

    /// Decode a direction-table rotation stream through the session memo.
    pub fn decode_directions<T: Element>(&mut self, raw: &[T]) -> Result<Vec<Quat>> {
        self.table.decode(raw, &mut self.directions)
    }

    /// Recast raw ticks and repair their ordering with the configured epsilon.
    pub fn decode_ticks<T: Element>(&self, raw: &[T]) -> Vec<f32> {
        decode_ticks(raw, self.config.tick_epsilon)
    }

    /// Verify every record when signature checks are enabled.
    ///
    /// Returns the number of records that failed.
    pub fn verify_archive(&self, archive: &mut Archive) -> usize {
        if !self.config.verify_signatures {
            tracing::debug!("signature checks disabled");
            return 0;
        }
        archive.verify_all(&self.verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::signature::tests::{sig_json, SCENE_PAYLOAD_SIG};
    use crate::archive::{ArchiveWriter, SignatureStatus};

    #[test]
    fn test_warn_once() {
        let mut session = DecodeSession::default();
        assert!(session.warn_once("missing:uv", || "uv channel missing".into()));
        assert!(!session.warn_once("missing:uv", || unreachable!()));
        assert!(session.warn_once("missing:color", || "color channel missing".into()));
        assert_eq!(session.warning_count(), 2);
    }

    #[test]
    fn test_direction_memo_shared_across_calls() {
        let mut session = DecodeSession::default();
        session.decode_directions(&[360u32, 0, 0]).unwrap();
        session.decode_directions(&[360u32, 0, 12]).unwrap();
        assert_eq!(session.direction_cache().len(), 1);
        assert_eq!(session.direction_cache().hits(), 1);
    }

    #[test]
    fn test_configured_resolution() {
        let config = DecodeConfig { direction_resolution: 4, ..Default::default() };
        let mut session = DecodeSession::new(config);
        assert_eq!(session.direction_table().resolution(), 4);
        assert!(session.decode_directions(&[5u8, 0, 0]).is_err());
    }

    #[test]
    fn test_ticks_use_configured_epsilon() {
        let config = DecodeConfig { tick_epsilon: 0.5, ..Default::default() };
        let session = DecodeSession::new(config);
        assert_eq!(session.decode_ticks(&[1u8, 1, 1]), vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_verify_archive_toggle() {
        let mut w = ArchiveWriter::new();
        w.add("scene", "application/json", b"scene payload", true);
        w.add("scene.sig", "application/json", &sig_json(&SCENE_PAYLOAD_SIG), false);
        w.add("other", "text/plain", b"x", false);
        let mut archive = Archive::open(&w.finish()).unwrap();

        let off = DecodeSession::new(DecodeConfig { verify_signatures: false, ..Default::default() });
        assert_eq!(off.verify_archive(&mut archive), 0);
        assert!(archive.signature_status("scene").is_none());

        let on = DecodeSession::default();
        assert_eq!(on.verify_archive(&mut archive), 1);
        assert_eq!(archive.signature_status("scene"), Some(SignatureStatus::Verified));
        assert_eq!(archive.signature_status("other"), Some(SignatureStatus::Missing));
    }
}
