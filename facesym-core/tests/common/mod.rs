#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use facesym_core::{
    BoundingBox, DetectedFace, DetectionError, DetectorOptions, FaceLandmarks, InitError,
    LandmarkProvider, OverlayCanvas, OverlayStyle, Orchestrator, SelectedFile,
};
use image::DynamicImage;
use serde::Deserialize;

/// Landmark fixture stored under `fixtures/landmarks/`.
#[derive(Debug, Deserialize)]
pub struct LandmarkFixture {
    pub image_size: [u32; 2],
    pub total_difference: f64,
    pub expected_score: u8,
    pub points: Vec<[f32; 2]>,
}

pub fn landmark_fixture(name: &str) -> LandmarkFixture {
    facesym_utils::load_fixture_json(format!("landmarks/{name}.json")).expect("landmark fixture")
}

pub fn face_from_fixture(name: &str) -> DetectedFace {
    let fixture = landmark_fixture(name);
    let landmarks = FaceLandmarks::from_pairs(&fixture.points).expect("68 fixture points");
    DetectedFace {
        bbox: BoundingBox {
            x: 16.0,
            y: 16.0,
            width: 32.0,
            height: 32.0,
        },
        confidence: 0.97,
        landmarks,
    }
}

pub fn png_upload(name: &str) -> SelectedFile {
    let bytes = facesym_utils::load_fixture_bytes("images/blank_64.png").expect("png fixture");
    SelectedFile::new(name, bytes)
}

/// In-memory provider returning queued detection results in order.
#[derive(Default)]
pub struct ScriptedProvider {
    pub fail_init: bool,
    initialized: bool,
    responses: Mutex<VecDeque<Result<Vec<DetectedFace>, DetectionError>>>,
    detect_calls: AtomicUsize,
    draws: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    pub fn with_responses(
        responses: impl IntoIterator<Item = Result<Vec<DetectedFace>, DetectionError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    /// Number of faces passed to each draw call.
    pub fn draws(&self) -> Vec<usize> {
        self.draws.lock().expect("draws lock").clone()
    }
}

impl LandmarkProvider for ScriptedProvider {
    async fn initialize(&mut self) -> Result<(), InitError> {
        if self.fail_init {
            return Err(InitError::Provider("scripted failure".into()));
        }
        self.initialized = true;
        Ok(())
    }

    async fn detect_faces(
        &self,
        _image: &DynamicImage,
        _options: &DetectorOptions,
    ) -> Result<Vec<DetectedFace>, DetectionError> {
        assert!(self.initialized, "detection issued before initialization");
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn draw_landmarks(&self, canvas: &mut OverlayCanvas, faces: &[DetectedFace]) {
        self.draws.lock().expect("draws lock").push(faces.len());
        canvas.draw_faces(faces);
    }
}

pub fn ready_orchestrator(provider: ScriptedProvider) -> Orchestrator<ScriptedProvider> {
    pollster::block_on(Orchestrator::load(
        provider,
        DetectorOptions::default(),
        OverlayStyle::default(),
    ))
}

pub fn provider(orchestrator: &Orchestrator<ScriptedProvider>) -> &ScriptedProvider {
    orchestrator.models().expect("models loaded").provider()
}
