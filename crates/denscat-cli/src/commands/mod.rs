use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod align;
pub mod profile;
pub mod regrid;

/// Output prefix: the explicit one if given, otherwise the input path without its
/// extension followed by `suffix`.
fn output_prefix(input: &Path, output: Option<&Path>, suffix: &str) -> PathBuf {
    if let Some(prefix) = output {
        return prefix.to_path_buf();
    }
    let mut prefix: OsString = input.with_extension("").into_os_string();
    prefix.push(suffix);
    PathBuf::from(prefix)
}

/// Appends `ending` to the prefix verbatim (`"out"` + `".regrid.dat"`).
fn with_ending(prefix: &Path, ending: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(ending);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_replaces_extension_with_suffix() {
        let prefix = output_prefix(Path::new("maps/6lyz.mrc"), None, "_rho");
        assert_eq!(prefix, PathBuf::from("maps/6lyz_rho"));
        assert_eq!(with_ending(&prefix, ".dat"), PathBuf::from("maps/6lyz_rho.dat"));
        assert_eq!(
            with_ending(&prefix, "_mod.mrc"),
            PathBuf::from("maps/6lyz_rho_mod.mrc")
        );
    }

    #[test]
    fn explicit_prefix_is_kept_as_is() {
        let prefix = output_prefix(Path::new("in.dat"), Some(Path::new("out/run.1")), "");
        assert_eq!(with_ending(&prefix, ".regrid.dat"), PathBuf::from("out/run.1.regrid.dat"));
    }
}
