//! Pre-built Picard operations, dispatched by name.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use super::runner::BroadRunner;
use crate::process::{with_tmp_dir, ProcessRunner, RunMode};
use crate::{BroadError, Result};

/// Named Picard operations available through [`BroadRunner::run_fn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicardFunction {
    Sort,
    Merge,
    Index,
    Reorder,
    MarkDuplicates,
    IndexRef,
}

/// Inputs for a named Picard operation; each operation reads what it needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PicardArgs {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub sort_order: Option<String>,
    pub remove_duplicates: bool,
}

impl PicardFunction {
    pub const ALL: [PicardFunction; 6] = [
        PicardFunction::Sort,
        PicardFunction::Merge,
        PicardFunction::Index,
        PicardFunction::Reorder,
        PicardFunction::MarkDuplicates,
        PicardFunction::IndexRef,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PicardFunction::Sort => "picard_sort",
            PicardFunction::Merge => "picard_merge",
            PicardFunction::Index => "picard_index",
            PicardFunction::Reorder => "picard_reorder",
            PicardFunction::MarkDuplicates => "picard_mark_duplicates",
            PicardFunction::IndexRef => "picard_index_ref",
        }
    }

    pub fn call<R: ProcessRunner>(&self, runner: &BroadRunner<R>, args: &PicardArgs) -> Result<PathBuf> {
        match self {
            PicardFunction::Sort => picard_sort(
                runner,
                first_input(args)?,
                args.sort_order.as_deref().unwrap_or("coordinate"),
                args.output.as_deref(),
            ),
            PicardFunction::Merge => {
                let output = args.output.as_deref().ok_or_else(|| {
                    BroadError::InvalidInput("picard_merge needs an output file".to_string())
                })?;
                picard_merge(runner, &args.inputs, output)
            }
            PicardFunction::Index => picard_index(runner, first_input(args)?),
            PicardFunction::Reorder => {
                let reference = args.reference.as_deref().ok_or_else(|| {
                    BroadError::InvalidInput("picard_reorder needs a reference".to_string())
                })?;
                picard_reorder(runner, first_input(args)?, reference, args.output.as_deref())
            }
            PicardFunction::MarkDuplicates => {
                picard_mark_duplicates(runner, first_input(args)?, args.remove_duplicates)
            }
            PicardFunction::IndexRef => {
                let reference = args
                    .reference
                    .as_deref()
                    .or_else(|| args.inputs.first().map(PathBuf::as_path))
                    .ok_or_else(|| {
                        BroadError::InvalidInput("picard_index_ref needs a reference".to_string())
                    })?;
                picard_index_ref(runner, reference)
            }
        }
    }
}

impl FromStr for PicardFunction {
    type Err = BroadError;

    fn from_str(s: &str) -> Result<Self> {
        PicardFunction::ALL
            .iter()
            .find(|f| f.name() == s)
            .copied()
            .ok_or_else(|| BroadError::UnknownOperation(s.to_string()))
    }
}

fn first_input(args: &PicardArgs) -> Result<&Path> {
    args.inputs
        .first()
        .map(PathBuf::as_path)
        .ok_or_else(|| BroadError::InvalidInput("no input file given".to_string()))
}

/// `<dir>/<stem><suffix>.<ext>` next to `in_file`
fn derived_path(in_file: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = in_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    in_file.with_file_name(format!("{}{}.{}", stem, suffix, ext))
}

fn opt(key: &str, value: impl AsRef<Path>) -> (String, String) {
    (key.to_string(), value.as_ref().display().to_string())
}

fn flag(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn already_done(out_file: &Path) -> bool {
    let exists = out_file.exists();
    if exists {
        debug!("{} exists, skipping", out_file.display());
    }
    exists
}

/// Sort a BAM file, by coordinate unless another order is given
pub fn picard_sort<R: ProcessRunner>(
    runner: &BroadRunner<R>,
    in_bam: &Path,
    sort_order: &str,
    out_file: Option<&Path>,
) -> Result<PathBuf> {
    let out_file = out_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(in_bam, "-sort", "bam"));
    if already_done(&out_file) {
        return Ok(out_file);
    }

    with_tmp_dir(None, |tmp| {
        let options = vec![
            opt("INPUT", in_bam),
            opt("OUTPUT", &out_file),
            opt("TMP_DIR", tmp),
            flag("SORT_ORDER", sort_order),
        ];
        runner.run("SortSam", &options, RunMode::Synchronous)
    })?;
    Ok(out_file)
}

/// Merge BAM files into a single coordinate sorted file
pub fn picard_merge<R: ProcessRunner>(
    runner: &BroadRunner<R>,
    in_files: &[PathBuf],
    out_file: &Path,
) -> Result<PathBuf> {
    if in_files.is_empty() {
        return Err(BroadError::InvalidInput("picard_merge needs input files".to_string()));
    }
    if already_done(out_file) {
        return Ok(out_file.to_path_buf());
    }

    with_tmp_dir(None, |tmp| {
        let mut options: Vec<(String, String)> =
            in_files.iter().map(|f| opt("INPUT", f)).collect();
        options.extend([
            opt("OUTPUT", out_file),
            flag("SORT_ORDER", "coordinate"),
            flag("USE_THREADING", "true"),
            opt("TMP_DIR", tmp),
        ]);
        runner.run("MergeSamFiles", &options, RunMode::Synchronous)
    })?;
    Ok(out_file.to_path_buf())
}

/// Build a `.bai` index alongside a BAM file
pub fn picard_index<R: ProcessRunner>(runner: &BroadRunner<R>, in_bam: &Path) -> Result<PathBuf> {
    let index_file = PathBuf::from(format!("{}.bai", in_bam.display()));
    if already_done(&index_file) {
        return Ok(index_file);
    }

    let options = vec![opt("INPUT", in_bam), opt("OUTPUT", &index_file)];
    runner.run("BuildBamIndex", &options, RunMode::Synchronous)?;
    Ok(index_file)
}

/// Reorder a BAM file to match the contig order of a reference
pub fn picard_reorder<R: ProcessRunner>(
    runner: &BroadRunner<R>,
    in_bam: &Path,
    ref_file: &Path,
    out_file: Option<&Path>,
) -> Result<PathBuf> {
    let out_file = out_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(in_bam, "-reorder", "bam"));
    if already_done(&out_file) {
        return Ok(out_file);
    }

    with_tmp_dir(None, |tmp| {
        let options = vec![
            opt("INPUT", in_bam),
            opt("OUTPUT", &out_file),
            opt("REFERENCE", ref_file),
            flag("ALLOW_INCOMPLETE_DICT_CONCORDANCE", "true"),
            opt("TMP_DIR", tmp),
        ];
        runner.run("ReorderSam", &options, RunMode::Synchronous)
    })?;
    Ok(out_file)
}

/// Mark (or remove) duplicate reads, writing metrics next to the output
pub fn picard_mark_duplicates<R: ProcessRunner>(
    runner: &BroadRunner<R>,
    in_bam: &Path,
    remove_dups: bool,
) -> Result<PathBuf> {
    let out_file = derived_path(in_bam, "-dup", "bam");
    let metrics_file = derived_path(in_bam, "", "dup_metrics");
    if already_done(&out_file) {
        return Ok(out_file);
    }

    with_tmp_dir(None, |tmp| {
        let options = vec![
            opt("INPUT", in_bam),
            opt("OUTPUT", &out_file),
            opt("TMP_DIR", tmp),
            flag("REMOVE_DUPLICATES", if remove_dups { "true" } else { "false" }),
            opt("METRICS_FILE", &metrics_file),
        ];
        runner.run("MarkDuplicates", &options, RunMode::Synchronous)
    })?;
    Ok(out_file)
}

/// Create a `.dict` sequence dictionary for a reference FASTA
pub fn picard_index_ref<R: ProcessRunner>(runner: &BroadRunner<R>, ref_file: &Path) -> Result<PathBuf> {
    let dict_file = derived_path(ref_file, "", "dict");
    if already_done(&dict_file) {
        return Ok(dict_file);
    }

    let options = vec![opt("REFERENCE", ref_file), opt("OUTPUT", &dict_file)];
    runner.run("CreateSequenceDictionary", &options, RunMode::Synchronous)?;
    Ok(dict_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PipelineConfig;
    use crate::testing::{RecordedCall, RecordingRunner};
    use std::fs;
    use tempfile::TempDir;

    fn runner_with_jars(dir: &Path, jars: &[&str]) -> BroadRunner<RecordingRunner> {
        for jar in jars {
            fs::write(dir.join(format!("{}.jar", jar)), b"").unwrap();
        }
        BroadRunner::with_runner(dir, None, &PipelineConfig::default(), RecordingRunner::new())
    }

    fn run_args(runner: &BroadRunner<RecordingRunner>) -> Vec<String> {
        match runner.process().calls().last() {
            Some(RecordedCall::Run { argv, .. }) => argv.clone(),
            other => panic!("Expected a synchronous run, got {:?}", other),
        }
    }

    #[test]
    fn test_names_round_trip() {
        for function in PicardFunction::ALL {
            assert_eq!(function.name().parse::<PicardFunction>().unwrap(), function);
        }
    }

    #[test]
    fn test_unknown_name() {
        match "SortSam".parse::<PicardFunction>() {
            Err(BroadError::UnknownOperation(name)) => assert_eq!(name, "SortSam"),
            other => panic!("Expected UnknownOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_derived_path() {
        assert_eq!(
            derived_path(Path::new("/data/sample1.bam"), "-sort", "bam"),
            PathBuf::from("/data/sample1-sort.bam")
        );
        assert_eq!(
            derived_path(Path::new("/ref/hg19.fa"), "", "dict"),
            PathBuf::from("/ref/hg19.dict")
        );
    }

    #[test]
    fn test_run_fn_sort() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_with_jars(tmp.path(), &["SortSam"]);
        let in_bam = tmp.path().join("sample1.bam");

        let args = PicardArgs {
            inputs: vec![in_bam.clone()],
            sort_order: Some("queryname".to_string()),
            ..Default::default()
        };
        let out = runner.run_fn("picard_sort", &args).unwrap();
        assert_eq!(out, tmp.path().join("sample1-sort.bam"));

        let argv = run_args(&runner);
        assert!(argv.contains(&format!("INPUT={}", in_bam.display())));
        assert!(argv.contains(&format!("OUTPUT={}", out.display())));
        assert!(argv.contains(&"SORT_ORDER=queryname".to_string()));
        assert!(argv.iter().any(|a| a.starts_with("TMP_DIR=")));
        assert_eq!(argv.last().map(String::as_str), Some("VALIDATION_STRINGENCY=SILENT"));
    }

    #[test]
    fn test_existing_output_skips_run() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_with_jars(tmp.path(), &["BuildBamIndex"]);
        let in_bam = tmp.path().join("sample1.bam");
        fs::write(tmp.path().join("sample1.bam.bai"), b"").unwrap();

        let out = picard_index(&runner, &in_bam).unwrap();
        assert_eq!(out, tmp.path().join("sample1.bam.bai"));
        assert!(runner.process().calls().is_empty());
    }

    #[test]
    fn test_merge_inputs_in_order() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_with_jars(tmp.path(), &["MergeSamFiles"]);
        let inputs = vec![tmp.path().join("a.bam"), tmp.path().join("b.bam")];
        let out_file = tmp.path().join("merged.bam");

        let args = PicardArgs {
            inputs: inputs.clone(),
            output: Some(out_file.clone()),
            ..Default::default()
        };
        assert_eq!(runner.run_fn("picard_merge", &args).unwrap(), out_file);

        let argv = run_args(&runner);
        let input_opts: Vec<&String> = argv.iter().filter(|a| a.starts_with("INPUT=")).collect();
        assert_eq!(
            input_opts,
            vec![
                &format!("INPUT={}", inputs[0].display()),
                &format!("INPUT={}", inputs[1].display())
            ]
        );
    }

    #[test]
    fn test_merge_requires_output() {
        let runner = runner_with_jars(TempDir::new().unwrap().path(), &[]);
        let args = PicardArgs {
            inputs: vec![PathBuf::from("a.bam")],
            ..Default::default()
        };
        assert!(matches!(
            runner.run_fn("picard_merge", &args),
            Err(BroadError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mark_duplicates() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_with_jars(tmp.path(), &["MarkDuplicates"]);
        let args = PicardArgs {
            inputs: vec![tmp.path().join("s1.bam")],
            remove_duplicates: true,
            ..Default::default()
        };
        let out = runner.run_fn("picard_mark_duplicates", &args).unwrap();
        assert_eq!(out, tmp.path().join("s1-dup.bam"));

        let argv = run_args(&runner);
        assert!(argv.contains(&"REMOVE_DUPLICATES=true".to_string()));
        assert!(argv.contains(&format!(
            "METRICS_FILE={}",
            tmp.path().join("s1.dup_metrics").display()
        )));
    }

    #[test]
    fn test_index_ref_from_reference() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_with_jars(tmp.path(), &["CreateSequenceDictionary"]);
        let args = PicardArgs {
            reference: Some(tmp.path().join("hg19.fa")),
            ..Default::default()
        };
        let out = runner.run_fn("picard_index_ref", &args).unwrap();
        assert_eq!(out, tmp.path().join("hg19.dict"));
    }

    #[test]
    fn test_reorder_requires_reference() {
        let runner = runner_with_jars(TempDir::new().unwrap().path(), &[]);
        let args = PicardArgs {
            inputs: vec![PathBuf::from("a.bam")],
            ..Default::default()
        };
        assert!(matches!(
            runner.run_fn("picard_reorder", &args),
            Err(BroadError::InvalidInput(_))
        ));
    }
}
