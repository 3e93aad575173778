//! Load `.transponster.toml` from a directory (CLI only). Lib callers build `Opts` directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Deserialize)]
pub(crate) struct TransponsterToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    scratch_location: Option<String>,
    max_items_per_stage: Option<usize>,
    batch_size: Option<usize>,
    max_tries: Option<usize>,
    progress_bar: Option<bool>,
    verbose: Option<bool>,
    keep_failed_scratch: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if missing or unreadable.
pub(crate) fn load_transponster_toml(dir: &Path) -> Option<TransponsterToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_transponster_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_transponster_toml(s: &str) -> Result<TransponsterToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $file_field:ident => $opts_field:ident) => {
        if let Some(v) = $section.$file_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
/// Inputs, output and script are never read from the file.
pub(crate) fn apply_file_to_opts(file: &TransponsterToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref p) = s.scratch_location {
        opts.scratch_location = Some(PathBuf::from(p));
    }
    apply_file_opt!(s, opts, max_items_per_stage => max_items_per_stage);
    apply_file_opt!(s, opts, batch_size => batch_size);
    apply_file_opt!(s, opts, max_tries => max_tries);
    apply_file_opt!(s, opts, progress_bar => progress_bar);
    apply_file_opt!(s, opts, verbose => verbose);
    apply_file_opt!(s, opts, keep_failed_scratch => keep_failed_scratch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let file = parse_transponster_toml(
            "[settings]\nbatch_size = 4\nmax_items_per_stage = 2\nprogress_bar = true\n",
        )
        .unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.batch_size, 4);
        assert_eq!(opts.max_items_per_stage, 2);
        assert!(opts.progress_bar);
        assert_eq!(opts.max_tries, Opts::default().max_tries);
    }

    #[test]
    fn empty_file_keeps_defaults() {
        let file = parse_transponster_toml("").unwrap();
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.batch_size, 1);
        assert!(opts.scratch_location.is_none());
    }
}
