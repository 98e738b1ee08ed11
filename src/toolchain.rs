//! Compiler introspection.
//!
//! Analyzers that preprocess sources themselves need the macros the real
//! compiler predefines (`__GNUC__`, `__x86_64__`, ...). These are read from
//! the compiler's own macro dump: `<cc> -dM -E -x c++ -` with empty input.

use std::path::Path;

use crate::util::process::{find_executable, ProcessBuilder};

const DEFINE_MARKER: &str = "#define";

/// Query a compiler for its predefined C++ macros.
///
/// Returns `NAME` or `NAME=VALUE` entries in the order the compiler printed
/// them. A compiler that cannot be found yields no macros; a compiler that
/// fails still has whatever it wrote to stdout parsed.
pub fn get_toolchain_defines(cc_path: Option<&Path>) -> Vec<String> {
    let Some(cc_path) = cc_path.filter(|p| !p.as_os_str().is_empty()) else {
        return Vec::new();
    };

    let Some(cc) = find_executable(cc_path) else {
        tracing::debug!(
            "compiler `{}` not found, skipping toolchain defines",
            cc_path.display()
        );
        return Vec::new();
    };

    let output = match ProcessBuilder::new(&cc)
        .args(["-dM", "-E", "-x", "c++", "-"])
        .stdin(Vec::new())
        .exec()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("failed to query defines from `{}`: {:#}", cc.display(), e);
            return Vec::new();
        }
    };

    if !output.status.success() {
        tracing::debug!(
            "`{}` exited with {:?} while dumping defines",
            cc.display(),
            output.status.code()
        );
    }

    let defines = parse_macro_definitions(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!("{} toolchain define(s) from `{}`", defines.len(), cc.display());
    defines
}

/// Parse `#define NAME [VALUE]` lines from a preprocessor macro dump.
///
/// Anything else in the output is ignored.
pub fn parse_macro_definitions(output: &str) -> Vec<String> {
    let mut defines = Vec::new();

    for line in output.lines() {
        let mut tokens = line.trim().splitn(3, ' ');
        if tokens.next() != Some(DEFINE_MARKER) {
            continue;
        }
        let Some(name) = tokens.next().filter(|n| !n.is_empty()) else {
            continue;
        };
        match tokens.next() {
            Some(value) => defines.push(format!("{}={}", name, value)),
            None => defines.push(name.to_string()),
        }
    }

    defines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_macro_definitions() {
        let output = "#define FOO 1\n#define BAR\n#define __VERSION__ \"13.2.0 (GCC)\"\n";
        assert_eq!(
            parse_macro_definitions(output),
            vec!["FOO=1", "BAR", "__VERSION__=\"13.2.0 (GCC)\""]
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        let output = "# 1 \"<stdin>\"\nwarning: something\n  #define SPACED 2\n#undef X\n#defineX 1\n";
        assert_eq!(parse_macro_definitions(output), vec!["SPACED=2"]);
    }

    #[test]
    fn test_missing_compiler_yields_nothing() {
        assert!(get_toolchain_defines(None).is_empty());
        assert!(get_toolchain_defines(Some(Path::new(""))).is_empty());
        assert!(
            get_toolchain_defines(Some(Path::new("/nonexistent/bin/no-such-cc"))).is_empty()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_compiler() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let cc = tmp.path().join("fake-cc");
        std::fs::write(
            &cc,
            "#!/bin/sh\ncat > /dev/null\necho '#define FOO 1'\necho '#define BAR'\n",
        )
        .unwrap();
        std::fs::set_permissions(&cc, std::fs::Permissions::from_mode(0o755)).unwrap();

        let defines = get_toolchain_defines(Some(cc.as_path()));
        assert_eq!(defines, vec!["FOO=1", "BAR"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_compiler_output_still_parsed() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let cc = tmp.path().join("broken-cc");
        std::fs::write(&cc, "#!/bin/sh\necho '#define PARTIAL 7'\nexit 1\n").unwrap();
        std::fs::set_permissions(&cc, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(get_toolchain_defines(Some(cc.as_path())), vec!["PARTIAL=7"]);
    }
}
