//! Mod loader log line classification
//!
//! Maps a single received line to the signals it carries. Rules are checked
//! in a fixed order and the first match wins; exact matches come before the
//! prefix/suffix patterns. Lines that match nothing are not an error.

use crate::progress::LoadEvent;
use crate::protocol::{
    CHAINLOADER_COMPLETE, CHAINLOADER_INITIALIZED, CHAINLOADER_STARTED, PRELOADER_FINISHED,
    PRELOADER_STARTED,
};
use thiserror::Error;

const PATCHER_PLUGINS_LOADED_SUFFIX: &str = " patcher plugins loaded";
const PATCHING_PREFIX: &str = "Patching ";
const EXECUTING_PREFIX: &str = "Executing ";
const PATCHES_SUFFIX: &str = " patch(es)";
const LOADING_PREFIX: &str = "Loading ";
const SKIPPING_PREFIX: &str = "Skipping ";
const PLUGINS_TO_LOAD_SUFFIX: &str = " plugins to load";

/// One effect of a classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Advance to at least this stage
    Stage(LoadEvent),
    /// Show this text as the status detail
    Detail(String),
    /// One more plugin was loaded or skipped
    PluginProcessed,
    /// Total number of plugins the chainloader will go through
    PluginCount(u32),
}

/// A recognized line whose numeric part could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("no plugin count at the start of \"{line}\"")]
    MissingCount { line: String },
    #[error("plugin count in \"{line}\" is out of range")]
    InvalidCount { line: String },
}

/// Classify one line. An empty list means the line carries no signal.
pub fn classify(line: &str) -> Result<Vec<Signal>, ClassifyError> {
    use LoadEvent::*;

    let signals = match line {
        PRELOADER_STARTED => vec![Signal::Stage(PreloaderStart)],
        PRELOADER_FINISHED => vec![Signal::Stage(PreloaderFinish)],
        CHAINLOADER_STARTED | CHAINLOADER_INITIALIZED => vec![Signal::Stage(ChainloaderStart)],
        CHAINLOADER_COMPLETE => vec![Signal::Stage(ChainloaderFinish), Signal::Stage(LoadFinished)],
        _ if line.ends_with(PATCHER_PLUGINS_LOADED_SUFFIX) => vec![Signal::Stage(PreloaderStart)],
        _ if line.starts_with(PATCHING_PREFIX)
            || (line.starts_with(EXECUTING_PREFIX) && line.ends_with(PATCHES_SUFFIX)) =>
        {
            vec![Signal::Stage(PreloaderStart), Signal::Detail(line.to_string())]
        }
        _ if line.starts_with(LOADING_PREFIX) => vec![
            Signal::Stage(ChainloaderStart),
            Signal::Detail(line.to_string()),
            Signal::PluginProcessed,
        ],
        _ if line.starts_with(SKIPPING_PREFIX) => {
            vec![Signal::Stage(ChainloaderStart), Signal::PluginProcessed]
        }
        _ if line.ends_with(PLUGINS_TO_LOAD_SUFFIX) => {
            let count = leading_count(line)?;
            vec![Signal::Stage(ChainloaderStart), Signal::PluginCount(count.max(1))]
        }
        _ => Vec::new(),
    };
    Ok(signals)
}

fn leading_count(line: &str) -> Result<u32, ClassifyError> {
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    let digits = &line[..digits_end];
    if digits.is_empty() {
        return Err(ClassifyError::MissingCount {
            line: line.to_string(),
        });
    }
    digits.parse().map_err(|_| ClassifyError::InvalidCount {
        line: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::normalize;
    use LoadEvent::*;

    #[test]
    fn test_exact_matches() {
        assert_eq!(classify("Preloader started").unwrap(), vec![Signal::Stage(PreloaderStart)]);
        assert_eq!(classify("Preloader finished").unwrap(), vec![Signal::Stage(PreloaderFinish)]);
        assert_eq!(classify("Chainloader started").unwrap(), vec![Signal::Stage(ChainloaderStart)]);
        assert_eq!(classify("Chainloader initialized").unwrap(), vec![Signal::Stage(ChainloaderStart)]);
        assert_eq!(
            classify("Chainloader startup complete").unwrap(),
            vec![Signal::Stage(ChainloaderFinish), Signal::Stage(LoadFinished)]
        );
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        assert!(classify("preloader started").unwrap().is_empty());
        assert!(classify("Preloader started ").unwrap().is_empty());
    }

    #[test]
    fn test_patch_lines_carry_detail() {
        assert_eq!(
            classify("Patching [Assembly-CSharp] with [SomePatcher]").unwrap(),
            vec![
                Signal::Stage(PreloaderStart),
                Signal::Detail("Patching [Assembly-CSharp] with [SomePatcher]".to_string()),
            ]
        );
        assert_eq!(
            classify("Executing 12 patch(es)").unwrap(),
            vec![Signal::Stage(PreloaderStart), Signal::Detail("Executing 12 patch(es)".to_string())]
        );
        // "Executing " alone is not a patch line
        assert!(classify("Executing cleanup").unwrap().is_empty());
        assert_eq!(classify("3 patcher plugins loaded").unwrap(), vec![Signal::Stage(PreloaderStart)]);
    }

    #[test]
    fn test_plugin_lines() {
        assert_eq!(
            classify("Loading [MoreCompany 1.7.2]").unwrap(),
            vec![
                Signal::Stage(ChainloaderStart),
                Signal::Detail("Loading [MoreCompany 1.7.2]".to_string()),
                Signal::PluginProcessed,
            ]
        );
        assert_eq!(
            classify("Skipping [Broken 0.1] because a newer version exists").unwrap(),
            vec![Signal::Stage(ChainloaderStart), Signal::PluginProcessed]
        );
    }

    #[test]
    fn test_plugin_count() {
        assert_eq!(
            classify("42 plugins to load").unwrap(),
            vec![Signal::Stage(ChainloaderStart), Signal::PluginCount(42)]
        );
        assert_eq!(
            classify("0 plugins to load").unwrap(),
            vec![Signal::Stage(ChainloaderStart), Signal::PluginCount(1)]
        );
    }

    #[test]
    fn test_bad_plugin_count_is_an_error() {
        assert_eq!(
            classify("Some plugins to load"),
            Err(ClassifyError::MissingCount {
                line: "Some plugins to load".to_string()
            })
        );
        assert!(matches!(
            classify("99999999999 plugins to load"),
            Err(ClassifyError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_first_match_wins() {
        // Starts with "Loading " and ends with " plugins to load": rule order picks Loading
        let signals = classify("Loading 5 plugins to load").unwrap();
        assert!(signals.contains(&Signal::PluginProcessed));
        assert!(!signals.iter().any(|s| matches!(s, Signal::PluginCount(_))));
    }

    #[test]
    fn test_unrecognized_line() {
        assert!(classify("garbage not matching any rule").unwrap().is_empty());
        assert!(classify("").unwrap().is_empty());
    }

    #[test]
    fn test_normalized_line_classifies_the_same() {
        let lines = [
            "Preloader started",
            "Chainloader startup complete",
            "Patching [UnityEngine] with [Fix]",
            "Loading [Plugin 1.0]",
            "Skipping [Plugin 1.0]",
            "17 plugins to load",
            "garbage not matching any rule",
            "Some plugins to load",
        ];
        for line in lines {
            assert_eq!(classify(&normalize(line)), classify(line), "line: {line}");
        }
    }

    #[test]
    fn test_normalized_multiline_keeps_signals() {
        let lines = [
            "Loading [A 1.0]\n  at frame",
            "Loading [B 2.0]\r\n  at frame",
            "Patching [Assembly-CSharp] with\t[Fix]",
            "Skipping [C 0.1]\n  incompatible",
        ];
        for line in lines {
            let raw = classify(line).unwrap();
            let wire = classify(&normalize(line)).unwrap();
            assert_eq!(raw.len(), wire.len(), "line: {line:?}");
            assert!(!raw.is_empty(), "line: {line:?}");

            for (before, after) in raw.iter().zip(&wire) {
                match (before, after) {
                    (Signal::Detail(before), Signal::Detail(after)) => {
                        assert_eq!(&normalize(before), after);
                        assert_ne!(before, after, "line: {line:?}");
                    }
                    _ => assert_eq!(before, after, "line: {line:?}"),
                }
            }
        }
    }
}
