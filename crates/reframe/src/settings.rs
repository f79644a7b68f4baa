use serde_derive::{Deserialize, Serialize};

/// Tunables of a [`Reassembler`](crate::Reassembler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Re-insert the cached parameter sets in band.
    ///
    /// - `0` never.
    /// - `-1` before every keyframe.
    /// - `N > 0` on the first keyframe at least `N` seconds after the last insertion.
    pub config_interval: i32,
    /// Insert an access unit delimiter into H.264 byte-stream output when the
    /// access unit has none.
    pub insert_aud: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            config_interval: 0,
            insert_aud: false,
        }
    }
}

impl ParserSettings {
    /// Parameter sets go before every keyframe.
    pub const fn every_keyframe(&self) -> bool {
        self.config_interval == -1
    }

    /// Periodic insertion interval in nanoseconds.
    pub const fn interval_ns(&self) -> Option<u64> {
        if self.config_interval > 0 {
            Some(self.config_interval as u64 * 1_000_000_000)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: ParserSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ParserSettings::default());
        assert!(!settings.every_keyframe());
        assert_eq!(settings.interval_ns(), None);
    }

    #[test]
    fn test_deserialize() {
        let settings: ParserSettings = serde_json::from_str(r#"{"config_interval": 2}"#).unwrap();
        assert_eq!(settings.interval_ns(), Some(2_000_000_000));
        assert!(!settings.insert_aud);

        let settings: ParserSettings = serde_json::from_str(r#"{"config_interval": -1, "insert_aud": true}"#).unwrap();
        assert!(settings.every_keyframe());
        assert!(settings.insert_aud);
        assert_eq!(settings.interval_ns(), None);
    }

    #[test]
    fn test_serialize() {
        let settings = ParserSettings {
            config_interval: 5,
            insert_aud: true,
        };
        insta::assert_snapshot!(serde_json::to_string(&settings).unwrap(), @r#"{"config_interval":5,"insert_aud":true}"#);
    }
}
