//! Command-line construction for the native toolchains.

use std::path::{Path, PathBuf};

use aiebin_targets::{NpuVersion, TargetArch};

use crate::env::{EnvLookup, CANONICAL_LICENSE_VAR, PATH_SEPARATOR};
use crate::error::{Result, ToolchainError};
use crate::locate::VitisInstall;
use crate::runner::{run_tool, ToolOutput};

/// A resolved program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run through [`run_tool`].
    pub fn run(&self, env: Option<&[(String, String)]>, verbose: bool) -> Result<ToolOutput> {
        run_tool(&self.program, &self.args, env, verbose)
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Baseline flags for peano `opt`. Peano has no vectorization cost model for
/// AIE, and the inlining/alias thresholds follow llvm-aie's driver defaults.
const PEANO_OPT_BASELINE: [&str; 10] = [
    "-vectorize-loops=false",
    "-vectorize-slp=false",
    // An if-then-else cascade needs ~5 delay slots for the condition and ~5
    // for one branch, so speculating 10 instructions is fine.
    "--two-entry-phi-node-folding-threshold=10",
    // Mandatory inlining before optimization loses noalias attributes.
    "-mandatory-inlining-before-opt=false",
    "-basic-aa-full-phi-analysis=true",
    "-basic-aa-max-lookup-search-depth=10",
    "-O3",
    "--inline-threshold=10",
    // missing from libc
    "--disable-builtin=memset",
    "-S",
];

/// An optimization-level flag such as `-O2` or `-Os`.
fn is_opt_level_flag(flag: &str) -> bool {
    flag.len() == 3 && flag.starts_with("-O")
}

/// Two flags that `opt` refuses to see together.
fn is_contention(a: &str, b: &str) -> bool {
    is_opt_level_flag(a) && is_opt_level_flag(b)
}

/// Merge user flags into `args`.
///
/// A flag that contends with an existing one replaces it in place. A flag
/// already present verbatim is skipped, so merging the same flags again is a
/// no-op. Anything else is appended.
pub fn merge_flags<'a>(args: &mut Vec<String>, extra: impl IntoIterator<Item = &'a str>) {
    for flag in extra {
        if args.iter().any(|a| a == flag) {
            continue;
        }
        match args.iter_mut().find(|a| is_contention(a, flag)) {
            Some(existing) => *existing = flag.to_string(),
            None => args.push(flag.to_string()),
        }
    }
}

/// Arguments for peano `opt`: the baseline, `-S <input> -o <output>`, then
/// any user flags.
///
/// `extra` must be empty or wrapped in literal double quotes, e.g.
/// `"-O2 -some-flag"`.
pub fn peano_opt_args(input: &Path, output: &Path, extra: &str) -> Result<Vec<String>> {
    let mut args: Vec<String> = PEANO_OPT_BASELINE.iter().map(|s| s.to_string()).collect();
    args.push(path_arg(input));
    args.push("-o".into());
    args.push(path_arg(output));

    if extra.is_empty() {
        return Ok(args);
    }

    let inner = extra
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|_| extra.len() >= 2)
        .ok_or_else(|| {
            log::error!("additional peano opt flags must be of the form \"-flag1 -flag2 ...\"");
            ToolchainError::MalformedExtraFlags {
                flags: extra.to_string(),
            }
        })?;

    merge_flags(&mut args, inner.split_whitespace());
    Ok(args)
}

/// Arguments for peano `llc` producing an object file.
pub fn llc_args(input: &Path, output: &Path, arch: TargetArch) -> Vec<String> {
    vec![
        path_arg(input),
        "-O2".into(),
        format!("--march={}", arch.as_lower()),
        "--function-sections".into(),
        "--filetype=obj".into(),
        "-o".into(),
        path_arg(output),
    ]
}

/// Arguments for linking a core ELF with the peano compiler driver.
pub fn peano_link_args(
    objects: &[PathBuf],
    arch: TargetArch,
    ld_script: &Path,
    elf: &Path,
    verbose: bool,
) -> Vec<String> {
    let mut args: Vec<String> = objects.iter().map(|o| path_arg(o)).collect();
    args.push(format!("--target={}", arch.elf_triple()));
    args.push("-Wl,--gc-sections".into());
    args.push("-Wl,--orphan-handling=error".into());
    args.push(format!("-Wl,-T,{}", ld_script.display()));
    args.push("-o".into());
    args.push(path_arg(elf));
    if verbose {
        args.push("-v".into());
    }
    args
}

/// `xchesscc` with the flags common to compiling and linking.
pub fn chess_command(
    install: &VitisInstall,
    work_dir: &Path,
    npu: NpuVersion,
    verbose: bool,
) -> ToolCommand {
    let aietools = install.aietools();
    let arch = npu.arch_version();
    let cmd = ToolCommand::new(install.xchesscc()).args([
        // single-threaded compilation
        "-j1".to_string(),
        // processor
        "-pme".to_string(),
        // processor model directory
        format!("-P{}", aietools.join("data").join(npu.model_dir()).join("lib").display()),
        // use the LLVM frontend (chess-clang)
        "-f".to_string(),
        "-CRelease_LLVM".to_string(),
        format!("+w{}", work_dir.display()),
        // adf headers
        "-D__AIENGINE__".to_string(),
        // aie_api headers
        format!("-D__AIE_ARCH__={arch}"),
        format!("-D__AIEARCH__={arch}"),
        format!("-I{}", aietools.join("include").display()),
    ]);
    if verbose {
        // disassemble output
        cmd.arg("-d")
    } else {
        cmd
    }
}

/// Trailing arguments for compiling `input` to `output` with chess.
pub fn chess_compile_args(input: &Path, output: &Path, extra: &[String]) -> Vec<String> {
    let mut args = extra.to_vec();
    args.push("-c".into());
    args.push(path_arg(input));
    args.push("-o".into());
    args.push(path_arg(output));
    args
}

/// Trailing arguments for linking objects into a core ELF with chess.
pub fn chess_link_args(objects: &[PathBuf], bcf: &Path, elf: &Path) -> Vec<String> {
    let mut args: Vec<String> = objects.iter().map(|o| path_arg(o)).collect();
    args.push("+l".into());
    args.push(path_arg(bcf));
    args.push("-o".into());
    args.push(path_arg(elf));
    args
}

/// Environment for running chess.
///
/// Built fresh per invocation: the search path gains the generation-specific
/// chess binaries, the library path gains the aietools runtime libraries, and
/// the license is re-exported under the name chess expects.
pub fn chess_env(
    install: &VitisInstall,
    npu: NpuVersion,
    env: &dyn EnvLookup,
) -> Vec<(String, String)> {
    let aietools = install.aietools();
    let path = join_paths([
        install.chess_bin_dir(npu).display().to_string(),
        env.var("PATH").unwrap_or_default(),
    ]);
    let ld_library_path = join_paths([
        aietools.join("lib").join("lnx64.o").display().to_string(),
        aietools.join("lnx64").join("tools").join("dot").join("lib").display().to_string(),
        env.var("LD_LIBRARY_PATH").unwrap_or_default(),
    ]);
    vec![
        ("PATH".to_string(), path),
        ("LD_LIBRARY_PATH".to_string(), ld_library_path),
        ("RDI_DATADIR".to_string(), aietools.join("data").display().to_string()),
        (CANONICAL_LICENSE_VAR.to_string(), install.license.clone()),
    ]
}

fn join_paths<const N: usize>(parts: [String; N]) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    fn opt(extra: &str) -> Result<Vec<String>> {
        peano_opt_args(Path::new("in.ll"), Path::new("out.ll"), extra)
    }

    #[test]
    fn baseline_without_extra_flags() {
        let args = opt("").unwrap();
        assert_eq!(args[0], "-vectorize-loops=false");
        assert_eq!(args[6], "-O3");
        assert_eq!(&args[args.len() - 4..], ["-S", "in.ll", "-o", "out.ll"]);
    }

    #[test]
    fn unquoted_flags_rejected() {
        assert!(matches!(
            opt("-O2"),
            Err(ToolchainError::MalformedExtraFlags { .. })
        ));
        assert!(matches!(
            opt("\"-O2"),
            Err(ToolchainError::MalformedExtraFlags { .. })
        ));
        assert!(matches!(
            opt("\""),
            Err(ToolchainError::MalformedExtraFlags { .. })
        ));
    }

    #[test]
    fn opt_level_replaced_in_place() {
        let baseline = opt("").unwrap();
        let args = opt("\"-O2\"").unwrap();
        assert_eq!(args.len(), baseline.len());
        assert_eq!(args[6], "-O2");
        for (i, (a, b)) in args.iter().zip(&baseline).enumerate() {
            if i != 6 {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn contention_replaces_and_others_append() {
        let baseline = opt("").unwrap();
        let args = opt("\"-O1 -Xfoo\"").unwrap();
        assert_eq!(args.len(), baseline.len() + 1);
        assert_eq!(args[6], "-O1");
        assert!(!args.contains(&"-O3".to_string()));
        assert_eq!(args.last().unwrap(), "-Xfoo");
    }

    #[test]
    fn remerge_is_idempotent() {
        let once = opt("\"-O1 -Xfoo --bar=2\"").unwrap();
        let mut twice = once.clone();
        merge_flags(&mut twice, ["-O1", "-Xfoo", "--bar=2"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_quotes_add_nothing() {
        assert_eq!(opt("\"\"").unwrap(), opt("").unwrap());
    }

    #[test]
    fn llc_and_link_flags() {
        let llc = llc_args(Path::new("a.opt.ll"), Path::new("a.o"), TargetArch::Aie2);
        assert_eq!(
            llc,
            ["a.opt.ll", "-O2", "--march=aie2", "--function-sections", "--filetype=obj", "-o", "a.o"]
        );

        let link = peano_link_args(
            &[PathBuf::from("input.o"), PathBuf::from("mm.o")],
            TargetArch::Aie2,
            Path::new("core_0_2.elf.ld"),
            Path::new("core_0_2.elf"),
            true,
        );
        assert_eq!(
            link,
            [
                "input.o",
                "mm.o",
                "--target=aie2-none-unknown-elf",
                "-Wl,--gc-sections",
                "-Wl,--orphan-handling=error",
                "-Wl,-T,core_0_2.elf.ld",
                "-o",
                "core_0_2.elf",
                "-v"
            ]
        );
    }

    fn install() -> VitisInstall {
        VitisInstall {
            root: PathBuf::from("/opt/vitis"),
            license: "2100@licsrv".into(),
        }
    }

    #[test]
    fn chess_flags_per_generation() {
        let cmd = chess_command(&install(), Path::new("/tmp/w"), NpuVersion::Npu4, false);
        assert_eq!(
            cmd.program,
            Path::new("/opt/vitis/aietools/bin/unwrapped/lnx64.o/xchesscc")
        );
        assert_eq!(
            cmd.args,
            [
                "-j1",
                "-pme",
                "-P/opt/vitis/aietools/data/aie2p/lib",
                "-f",
                "-CRelease_LLVM",
                "+w/tmp/w",
                "-D__AIENGINE__",
                "-D__AIE_ARCH__=21",
                "-D__AIEARCH__=21",
                "-I/opt/vitis/aietools/include",
            ]
        );
        let verbose = chess_command(&install(), Path::new("/tmp/w"), NpuVersion::Npu1, true);
        assert_eq!(verbose.args.last().unwrap(), "-d");
        assert!(verbose.args.contains(&"-D__AIE_ARCH__=20".to_string()));
    }

    #[test]
    fn chess_link_tail() {
        let tail = chess_link_args(
            &[PathBuf::from("input.o"), PathBuf::from("wrap.o")],
            Path::new("c.bcf"),
            Path::new("c.elf"),
        );
        assert_eq!(tail, ["input.o", "wrap.o", "+l", "c.bcf", "-o", "c.elf"]);
    }

    #[test]
    fn chess_env_reexports_license() {
        let env = MapEnv::new()
            .with("PATH", "/usr/bin")
            .with("LM_LICENSE_FILE", "ignored-here");
        let vars = chess_env(&install(), NpuVersion::Npu1, &env);
        assert_eq!(vars.len(), 4);
        assert_eq!(
            vars[0],
            (
                "PATH".to_string(),
                "/opt/vitis/aietools/tps/lnx64/target_aie_ml/bin/LNa64bin:/usr/bin".to_string()
            )
        );
        assert_eq!(
            vars[1].1,
            "/opt/vitis/aietools/lib/lnx64.o:/opt/vitis/aietools/lnx64/tools/dot/lib"
        );
        assert_eq!(vars[2].1, "/opt/vitis/aietools/data");
        assert_eq!(
            vars[3],
            ("XILINXD_LICENSE_FILE".to_string(), "2100@licsrv".to_string())
        );
    }
}
