use std::path::{Path, PathBuf};
use std::time::Duration;

use common::test_utils::test_output_path;
use common::FloatExt;
use glam::DVec3;
use imaginarium::{ColorFormat, Image, ImageDesc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use super::{CaptureBehavior, RecordingRenderer};
use crate::capture::CapturePolicy;
use crate::config::Config;
use crate::flat_renderer::FlatRenderer;
use crate::occlusion::VisibilityMask;
use crate::pipeline::{Generator, Mode, PassError};
use crate::render::{Lighting, SceneRenderer};

/// Scratch directory with backgrounds and models for one test.
struct Fixture {
    root: PathBuf,
}

impl Fixture {
    fn new(name: &str, backgrounds: &[(&str, [u8; 3])], models: &[&str]) -> Self {
        let root = test_output_path(name);
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("backgrounds")).unwrap();
        std::fs::create_dir_all(root.join("models")).unwrap();

        for (file, color) in backgrounds {
            let desc = ImageDesc::new(8, 6, ColorFormat::RGB_U8);
            Image::new_filled(desc, color)
                .unwrap()
                .save_file(root.join("backgrounds").join(file))
                .unwrap();
        }
        for model in models {
            std::fs::write(root.join("models").join(model), "o cube\n").unwrap();
        }

        Self { root }
    }

    fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    fn masks(&self) -> PathBuf {
        self.root.join("masks")
    }

    fn config(&self, num_objects: u32, translations: Value) -> Config {
        Config::from_value(json!({
            "generator": {
                "input": {
                    "background_folder": self.root.join("backgrounds"),
                    "model_folder": self.root.join("models"),
                    "bg_augmentation": false
                },
                "output": {
                    "size": { "width": 16, "height": 12 },
                    "output_folder": self.out(),
                    "extension": "png",
                    "mask_folder": self.masks(),
                    "num_objects": num_objects,
                    "obj_shifts": { "x": 1.0, "x_to": 2.0, "y": 0.0, "y_to": 0.5, "z": 0.0, "z_to": 1.0 }
                },
                "translations": translations
            }
        }))
        .unwrap()
    }
}

fn sweep_x(count: u32) -> Value {
    json!([{
        "count": count,
        "random": false,
        "position": { "x": { "from": 0.0, "to": 2.0 } },
        "scale": { "from": 1.0, "to": 1.0 }
    }])
}

fn policy() -> CapturePolicy {
    CapturePolicy {
        max_polls: 100,
        poll_interval: Duration::from_millis(30),
        preview_delay: Duration::from_millis(1),
    }
}

fn generator<R: SceneRenderer>(config: Config, renderer: R, mode: Mode) -> Generator<R> {
    Generator::new(config, renderer, StdRng::seed_from_u64(1234), mode).with_capture_policy(policy())
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn single_model_stepped_sweep() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_single_sweep", &[("bg.png", [10, 20, 30])], &["cube.obj"]);
    let config = fixture.config(1, sweep_x(3));

    let mut generator = generator(config, FlatRenderer::new(16), Mode::Generate);
    let summary = generator.run().await?;

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.saved, 3);
    assert!(!summary.interrupted);

    let folder = fixture.out().join("0");
    assert_eq!(
        file_names(&folder),
        vec!["1.png", "2.png", "3.png", "info.txt", "labels.csv"]
    );

    let labels = std::fs::read_to_string(folder.join("labels.csv"))?;
    assert_eq!(
        labels,
        "file,px,py,pz,ax,ay,az,s\n\
         1,0,0,0,0,0,0,1\n\
         2,0.666667,0,0,0,0,0,1\n\
         3,1.33333,0,0,0,0,0,1\n"
    );

    let info = std::fs::read_to_string(folder.join("info.txt"))?;
    assert!(info.starts_with("model :"));
    assert!(info.contains("cube.obj\nconfiguration: \n{"));

    let frame = Image::read_file(folder.join("2.png"))?;
    assert_eq!(frame.desc().width, 16);
    assert_eq!(frame.desc().height, 12);
    assert_eq!(frame.pixel(3, 3, 0), &[10, 20, 30]);

    Ok(())
}

#[tokio::test]
async fn multi_object_writes_combined_and_isolated_masks() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "pipeline_multi_files",
        &[("bg.png", [0, 90, 0])],
        &["a.obj", "b.obj"],
    );
    let config = fixture.config(1, sweep_x(2));

    let mut generator = generator(config, FlatRenderer::new(16), Mode::Multi);
    let summary = generator.run().await?;

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.masks, 6);
    assert_eq!(summary.saved, 8);

    assert_eq!(
        file_names(&fixture.out()),
        vec!["1.png", "2.png", "info.txt", "labels.csv"]
    );
    assert_eq!(
        file_names(&fixture.masks()),
        vec![
            "0_1_mask.png",
            "0_2_mask.png",
            "1_1_mask.png",
            "1_2_mask.png",
            "bg_1_mask.png",
            "bg_2_mask.png",
        ]
    );

    let info = std::fs::read_to_string(fixture.out().join("info.txt"))?;
    assert!(info.starts_with("Multiple models :\nmodel :"));
    assert_eq!(info.matches("model :").count(), 2);

    let labels = std::fs::read_to_string(fixture.out().join("labels.csv"))?;
    assert_eq!(labels.lines().count(), 3);

    // no mask background configured, masks fall back to black
    let mask = Image::read_file(fixture.masks().join("bg_1_mask.png"))?;
    assert_eq!(mask.pixel(0, 0, 0), &[0, 0, 0]);

    Ok(())
}

#[tokio::test]
async fn multi_object_hides_parks_and_isolates() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "pipeline_multi_visibility",
        &[("bg.png", [1, 2, 3])],
        &["a.obj", "b.obj"],
    );
    let config = fixture.config(1, sweep_x(3));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Multi);
    generator.run().await?;
    let renderer = generator.into_renderer();

    let snapshots = renderer.snapshots();
    assert_eq!(snapshots.len(), 3 * 4);

    for (j, frame) in snapshots.chunks(4).enumerate() {
        let center = DVec3::new(2.0 * j as f64 / 3.0, 0.0, 0.0);
        let [main, combined, first, second] = frame else {
            unreachable!()
        };

        assert_eq!(main.lighting, Some(Lighting::default()));
        let visible: Vec<usize> = (0..2).filter(|&i| main.visible[i]).collect();
        for i in 0..2 {
            if !main.visible[i] {
                let parked = main.poses[i].position;
                assert!(parked.x.approximately_eq(center.x));
                assert_eq!(parked.y, 0.0);
                assert_eq!(parked.z, 0.0);
            }
        }
        if !visible.is_empty() {
            let mean = visible
                .iter()
                .map(|&i| main.poses[i].position)
                .sum::<DVec3>()
                / visible.len() as f64;
            assert!(mean.x.approximately_eq(center.x));
            assert!(mean.y.approximately_eq(center.y));
            assert!(mean.z.approximately_eq(center.z));
        }

        for mask in [combined, first, second] {
            assert_eq!(mask.lighting, Some(Lighting::DARK));
        }
        assert_eq!(combined.visible, main.visible);
        assert_eq!(first.visible, vec![main.visible[0], false]);
        assert_eq!(second.visible, vec![false, main.visible[1]]);

        let id = j + 1;
        assert_eq!(main.target, Some(fixture.out().join(format!("{id}.png"))));
        assert_eq!(combined.target, Some(fixture.masks().join(format!("bg_{id}_mask.png"))));
        assert_eq!(first.target, Some(fixture.masks().join(format!("0_{id}_mask.png"))));
        assert_eq!(second.target, Some(fixture.masks().join(format!("1_{id}_mask.png"))));
    }

    assert_eq!(renderer.lighting(), Some(Lighting::default()));
    Ok(())
}

#[tokio::test]
async fn multi_object_single_survivor_takes_the_center() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "pipeline_multi_single_survivor",
        &[("bg.png", [1, 2, 3])],
        &["a.obj", "b.obj"],
    );
    let config = fixture.config(1, sweep_x(2));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Multi).with_visibility_plan(vec![
        VisibilityMask::from_bits(0b01),
        VisibilityMask::ALL_VISIBLE,
    ]);
    let summary = generator.run().await?;
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.masks, 6);

    let renderer = generator.into_renderer();
    let snapshots = renderer.snapshots();
    assert_eq!(snapshots.len(), 2 * 4);

    // frame 1: object 0 hidden, object 1 alone in its group
    let [main, combined, first, second] = &snapshots[..4] else {
        unreachable!()
    };
    assert_eq!(main.visible, vec![false, true]);
    assert_eq!(main.poses[0].position, DVec3::ZERO);
    assert_eq!(main.poses[1].position, DVec3::ZERO);
    assert_eq!(combined.visible, vec![false, true]);
    assert_eq!(first.visible, vec![false, false]);
    assert_eq!(second.visible, vec![false, true]);
    assert_eq!(first.target, Some(fixture.masks().join("0_1_mask.png")));
    assert_eq!(second.target, Some(fixture.masks().join("1_1_mask.png")));

    // frame 2: both visible, split around the center
    let main = &snapshots[4];
    let center = DVec3::new(1.0, 0.0, 0.0);
    assert_eq!(main.visible, vec![true, true]);
    assert_ne!(main.poses[0].position, main.poses[1].position);
    let mean = (main.poses[0].position + main.poses[1].position) / 2.0;
    assert!(mean.x.approximately_eq(center.x));
    assert!(mean.y.approximately_eq(center.y));
    assert!(mean.z.approximately_eq(center.z));

    Ok(())
}

#[tokio::test]
async fn masks_mode_names_masks_per_model() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "pipeline_masks_names",
        &[("bg.png", [5, 5, 5])],
        &["a.obj", "b.obj"],
    );
    let config = fixture.config(2, sweep_x(1));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Masks);
    let summary = generator.run().await?;
    let renderer = generator.into_renderer();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.masks, 2);
    assert_eq!(
        renderer.captures(),
        vec![
            Some(fixture.out().join("0").join("1.png")),
            Some(fixture.masks().join("0_1_mask.png")),
            Some(fixture.out().join("1").join("1.png")),
            Some(fixture.masks().join("1_1_mask.png")),
        ]
    );
    // two copies of the last model share the scene
    assert_eq!(renderer.models().len(), 2);
    assert!(renderer.models()[0].ends_with("b.obj"));
    assert_eq!(renderer.lighting(), Some(Lighting::default()));

    Ok(())
}

#[tokio::test]
async fn masks_mode_single_model_uses_short_names() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_masks_single", &[("bg.png", [5, 5, 5])], &["a.obj"]);
    let config = fixture.config(1, sweep_x(2));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Masks);
    generator.run().await?;
    let captures = generator.into_renderer().captures();

    assert_eq!(captures[1], Some(fixture.masks().join("1_mask.png")));
    assert_eq!(captures[3], Some(fixture.masks().join("2_mask.png")));
    Ok(())
}

#[tokio::test]
async fn backgrounds_cycle_across_models() -> anyhow::Result<()> {
    let fixture = Fixture::new(
        "pipeline_background_cycle",
        &[("a.png", [10, 0, 0]), ("b.png", [20, 0, 0])],
        &["one.obj", "two.obj"],
    );
    let config = fixture.config(1, sweep_x(2));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Generate);
    generator.run().await?;
    let renderer = generator.into_renderer();

    let firsts: Vec<u8> = renderer
        .snapshots()
        .iter()
        .map(|s| s.background.as_ref().unwrap()[0])
        .collect();
    assert_eq!(firsts, vec![20, 10, 20, 10]);

    Ok(())
}

#[tokio::test]
async fn preview_writes_nothing() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_preview", &[("bg.png", [1, 1, 1])], &["a.obj"]);
    let config = fixture.config(3, sweep_x(2));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Preview);
    let summary = generator.run().await?;
    let renderer = generator.into_renderer();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.saved, 0);
    assert_eq!(renderer.captures(), vec![None, None]);
    assert_eq!(renderer.models().len(), 3);
    assert!(!fixture.out().exists());

    Ok(())
}

#[tokio::test]
async fn closed_viewer_ends_the_run() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_closed", &[("bg.png", [1, 1, 1])], &["a.obj", "b.obj"]);
    let config = fixture.config(1, sweep_x(5));

    let renderer = RecordingRenderer::new().close_after(2);
    let mut generator = generator(config, renderer, Mode::Generate);
    let summary = generator.run().await?;

    assert!(summary.interrupted);
    assert_eq!(summary.frames, 2);
    assert_eq!(generator.renderer().snapshots().len(), 2);

    let labels = std::fs::read_to_string(fixture.out().join("0").join("labels.csv"))?;
    assert_eq!(labels.lines().count(), 3);
    assert!(!fixture.out().join("1").exists());

    Ok(())
}

#[tokio::test]
async fn stalled_captures_time_out_and_continue() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_stalled", &[("bg.png", [1, 1, 1])], &["a.obj"]);
    let config = fixture.config(1, sweep_x(3));

    let renderer = RecordingRenderer::new().with_capture(CaptureBehavior::Stall);
    let mut generator = Generator::new(config, renderer, StdRng::seed_from_u64(5), Mode::Generate)
        .with_capture_policy(CapturePolicy {
            max_polls: 2,
            poll_interval: Duration::from_millis(5),
            preview_delay: Duration::from_millis(1),
        });
    let summary = generator.run().await?;

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.timed_out, 3);
    assert_eq!(summary.saved, 0);
    assert!(fixture.out().join("0").join("labels.csv").exists());

    Ok(())
}

#[tokio::test]
async fn failed_captures_are_not_fatal() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_failed", &[("bg.png", [1, 1, 1])], &["a.obj"]);
    let config = fixture.config(1, sweep_x(2));

    let renderer = RecordingRenderer::new().with_capture(CaptureBehavior::Fail);
    let summary = generator(config, renderer, Mode::Generate).run().await?;

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.failed, 2);

    Ok(())
}

#[tokio::test]
async fn missing_assets_are_fatal() {
    let fixture = Fixture::new("pipeline_no_backgrounds", &[], &["a.obj"]);
    let result = generator(fixture.config(1, sweep_x(1)), RecordingRenderer::new(), Mode::Generate)
        .run()
        .await;
    assert!(matches!(result, Err(PassError::NoBackgrounds(_))));

    let fixture = Fixture::new("pipeline_no_models", &[("bg.png", [1, 1, 1])], &[]);
    let result = generator(fixture.config(1, sweep_x(1)), RecordingRenderer::new(), Mode::Generate)
        .run()
        .await;
    assert!(matches!(result, Err(PassError::NoModels(_))));
}

#[tokio::test]
async fn unreadable_background_is_skipped() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_bad_background", &[("good.png", [7, 7, 7])], &["a.obj"]);
    std::fs::write(fixture.root.join("backgrounds").join("broken.jpg"), b"not a jpeg")?;
    let config = fixture.config(1, sweep_x(2));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::Generate);
    let summary = generator.run().await?;

    assert_eq!(summary.frames, 2);
    for snapshot in generator.renderer().snapshots() {
        assert_eq!(snapshot.background, Some(vec![7, 7, 7]));
    }

    Ok(())
}

#[tokio::test]
async fn too_many_models_for_one_scene() {
    let fixture = Fixture::new(
        "pipeline_too_many",
        &[("bg.png", [1, 1, 1])],
        &["1.obj", "2.obj", "3.obj", "4.obj", "5.obj"],
    );
    let result = generator(fixture.config(1, sweep_x(1)), RecordingRenderer::new(), Mode::Multi)
        .run()
        .await;

    assert!(matches!(result, Err(PassError::TooManyModels(5))));
}

#[tokio::test]
async fn check_config_renders_nothing() -> anyhow::Result<()> {
    let fixture = Fixture::new("pipeline_check_config", &[], &[]);
    let config = fixture.config(1, sweep_x(4));

    let mut generator = generator(config, RecordingRenderer::new(), Mode::CheckConfig);
    let summary = generator.run().await?;

    assert_eq!(summary.frames, 0);
    assert!(generator.renderer().snapshots().is_empty());
    assert_eq!(generator.config().generator.total_frames(), 4);

    Ok(())
}
