use image::{ImageBuffer, RgbImage, Rgb};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zeroshot_annotate::{BoundingBox, Detection, DetectionOracle};

/// Input and output folders for one test run.
/// Both are removed when dropped.
pub struct Workspace {
    pub dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let input = dir.path().join("imgs");
        let output = dir.path().join("annotated");
        std::fs::create_dir(&input).expect("Failed to create input folder");
        Self { dir, input, output }
    }

    /// Writes a solid-colour image; the format follows the extension of `name`.
    pub fn add_image(&self, name: &str, color: [u8; 3]) -> PathBuf {
        let img: RgbImage = ImageBuffer::from_fn(64, 48, |_, _| Rgb(color));
        let path = self.input.join(name);
        img.save(&path).expect("Failed to save test image");
        path
    }

    pub fn add_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.input.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    pub fn report_path(&self) -> PathBuf {
        self.output.join("annotated.json")
    }
}

/// Every (image path, labels) pair a detector was called with
pub type CallLog = Rc<RefCell<Vec<(PathBuf, Vec<String>)>>>;

/// Detector whose answers are fixed per image file name
#[derive(Default)]
pub struct ScriptedOracle {
    pub answers: HashMap<String, Vec<Detection>>,
    calls: CallLog,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle on the calls, still readable after the oracle moves into a pipeline
    pub fn call_log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    pub fn answer(mut self, file_name: &str, detections: Vec<Detection>) -> Self {
        self.answers.insert(file_name.to_string(), detections);
        self
    }
}

impl DetectionOracle for ScriptedOracle {
    fn detect(
        &mut self,
        _image: &RgbImage,
        source_path: &Path,
        candidate_labels: &[String],
    ) -> anyhow::Result<Vec<Detection>> {
        self.calls
            .borrow_mut()
            .push((source_path.to_path_buf(), candidate_labels.to_vec()));
        let name = source_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(self.answers.get(name).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Detector that always fails
pub struct FailingOracle;

impl DetectionOracle for FailingOracle {
    fn detect(&mut self, _: &RgbImage, _: &Path, _: &[String]) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("model crashed")
    }

    fn name(&self) -> &str {
        "Failing"
    }
}

pub fn det(b: [f32; 4], label: &str, score: f32) -> Detection {
    Detection::new(
        BoundingBox::new(b[0], b[1], b[2], b[3]).expect("valid test box"),
        label,
        score,
    )
    .expect("valid test detection")
}

pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub const RED: [u8; 3] = [255, 0, 0];
pub const BLACK: [u8; 3] = [0, 0, 0];
