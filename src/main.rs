use clap::{Parser, ValueEnum};
use log::{error, info};
use lumen::io::image::save_buffer_to_image;
use lumen::io::obj_loader::load_obj;
use lumen::pipeline::renderer::Renderer;
use lumen::scene::Scene;
use lumen::scene::mesh::Mesh;
use lumen::scene::object::SceneObject;
use lumen::scene::texture::Texture;
use nalgebra::Vector3;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScenePreset {
    /// A closed box with colored walls, two cubes and a ceiling light.
    Cornell,
    /// Sphere, torus and cube on a checkered floor under two lights.
    Showcase,
    /// A single model with a light orbiting it; best with --frames > 1.
    Orbit,
}

#[derive(Parser, Debug)]
#[command(version, about = "CPU software rasterizer demo scenes")]
struct Args {
    #[arg(long, default_value_t = 800)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    #[arg(long, value_enum, default_value_t = ScenePreset::Showcase)]
    scene: ScenePreset,

    /// Output image path; with --frames > 1 the frame index is appended.
    #[arg(long, default_value = "render.png")]
    output: String,

    #[arg(long, default_value_t = 1)]
    frames: usize,

    /// OBJ model for the orbit scene's centerpiece (default: torus).
    #[arg(long)]
    obj: Option<String>,

    /// Texture image for the centerpiece (default: checkerboard).
    #[arg(long)]
    texture: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let mut renderer = Renderer::new(args.width, args.height)?;
    let mut scene = build_scene(args)?;

    let frames = args.frames.max(1);
    for frame in 0..frames {
        advance_scene(&mut scene, args.scene, frame, frames);

        let pixels = renderer.render(&scene);
        let path = frame_path(&args.output, frame, frames);
        save_buffer_to_image(pixels, args.width, args.height, &path)?;
        info!("Frame {}/{} written to {}", frame + 1, frames, path);
    }

    Ok(())
}

fn build_scene(args: &Args) -> Result<Scene, String> {
    let centerpiece_mesh: Arc<Mesh> = match &args.obj {
        Some(path) => Arc::new(load_obj(path)?),
        None => Arc::new(Mesh::torus(0.4, 32)),
    };
    let centerpiece_texture = match &args.texture {
        Some(path) => Texture::load(path)?,
        None => Texture::checker(16, 16),
    };

    let mut scene = Scene::new();
    match args.scene {
        ScenePreset::Cornell => {
            scene.camera.position = Vector3::new(0.0, 0.0, 7.5);
            scene.ambient_light = 0.05;

            let wall = |color| {
                SceneObject::surface(Arc::new(Mesh::plane()), Texture::color(color))
                    .with_scale(Vector3::new(6.0, 1.0, 6.0))
            };
            let white = Vector3::new(0.9, 0.9, 0.9);
            scene.insert("floor", wall(white).with_position(Vector3::new(0.0, -3.0, 0.0)));
            scene.insert(
                "ceiling",
                wall(white)
                    .with_position(Vector3::new(0.0, 3.0, 0.0))
                    .with_euler_angles(Vector3::new(180.0, 0.0, 0.0)),
            );
            scene.insert(
                "back",
                wall(white)
                    .with_position(Vector3::new(0.0, 0.0, -3.0))
                    .with_euler_angles(Vector3::new(90.0, 0.0, 0.0)),
            );
            scene.insert(
                "left",
                wall(Vector3::new(0.9, 0.1, 0.1))
                    .with_position(Vector3::new(-3.0, 0.0, 0.0))
                    .with_euler_angles(Vector3::new(0.0, 0.0, -90.0)),
            );
            scene.insert(
                "right",
                wall(Vector3::new(0.1, 0.9, 0.1))
                    .with_position(Vector3::new(3.0, 0.0, 0.0))
                    .with_euler_angles(Vector3::new(0.0, 0.0, 90.0)),
            );

            scene.insert(
                "tall box",
                SceneObject::surface(Arc::new(Mesh::cube()), Texture::color(white))
                    .with_position(Vector3::new(-1.1, -1.5, -1.0))
                    .with_euler_angles(Vector3::new(0.0, 20.0, 0.0))
                    .with_scale(Vector3::new(1.2, 3.0, 1.2)),
            );
            scene.insert(
                "short box",
                SceneObject::surface(Arc::new(Mesh::cube()), Texture::color(white))
                    .with_position(Vector3::new(1.2, -2.25, 0.4))
                    .with_euler_angles(Vector3::new(0.0, -15.0, 0.0))
                    .with_scale(Vector3::new(1.5, 1.5, 1.5)),
            );
            scene.insert(
                "lamp",
                SceneObject::light(18.0, Vector3::new(1.0, 0.95, 0.85))
                    .with_position(Vector3::new(0.0, 2.6, 0.0)),
            );
        }
        ScenePreset::Showcase => {
            scene.camera.position = Vector3::new(0.0, 1.5, 6.0);
            scene.camera.euler_angles = Vector3::new(-10.0, 0.0, 0.0);
            scene.skybox = Some(Texture::color(Vector3::new(0.1, 0.12, 0.2)));

            scene.insert(
                "floor",
                SceneObject::surface(Arc::new(Mesh::plane()), Texture::checker(24, 24))
                    .with_position(Vector3::new(0.0, -1.0, 0.0))
                    .with_scale(Vector3::new(14.0, 1.0, 14.0))
                    .with_shininess(4.0),
            );
            scene.insert(
                "sphere",
                SceneObject::surface(
                    Arc::new(Mesh::sphere(32)),
                    Texture::color(Vector3::new(0.8, 0.3, 0.3)),
                )
                .with_position(Vector3::new(-2.0, 0.0, 0.0))
                .with_shininess(64.0),
            );
            scene.insert(
                "torus",
                SceneObject::surface(Arc::new(Mesh::torus(0.35, 32)), centerpiece_texture)
                    .with_position(Vector3::new(0.0, 0.0, -0.5))
                    .with_euler_angles(Vector3::new(-60.0, 0.0, 0.0)),
            );
            scene.insert(
                "cube",
                SceneObject::surface(
                    Arc::new(Mesh::cube()),
                    Texture::color(Vector3::new(0.3, 0.4, 0.8)),
                )
                .with_position(Vector3::new(2.0, -0.4, 0.5))
                .with_euler_angles(Vector3::new(0.0, 30.0, 0.0))
                .with_scale(Vector3::repeat(1.2)),
            );

            scene.insert(
                "key light",
                SceneObject::light(30.0, Vector3::new(1.0, 1.0, 0.95))
                    .with_position(Vector3::new(3.0, 4.0, 3.0)),
            );
            scene.insert(
                "fill light",
                SceneObject::light(8.0, Vector3::new(0.4, 0.5, 1.0))
                    .with_position(Vector3::new(-4.0, 1.0, 2.0)),
            );
        }
        ScenePreset::Orbit => {
            scene.camera.position = Vector3::new(0.0, 1.0, 4.0);
            scene.camera.euler_angles = Vector3::new(-12.0, 0.0, 0.0);
            scene.ambient_light = 0.08;

            scene.insert(
                "model",
                SceneObject::surface(centerpiece_mesh, centerpiece_texture),
            );
            scene.insert(
                "orbiter",
                SceneObject::light(12.0, Vector3::new(1.0, 0.9, 0.7))
                    .with_position(Vector3::new(3.0, 1.5, 0.0)),
            );
        }
    }

    Ok(scene)
}

/// Per-frame animation: each preset mutates its own objects through the
/// scene's name-keyed accessors, the way interactive callers would.
fn advance_scene(scene: &mut Scene, preset: ScenePreset, frame: usize, frames: usize) {
    let phase = frame as f32 / frames as f32;
    let angle = 360.0 * phase;

    match preset {
        ScenePreset::Cornell => {
            if let Some(tall) = scene.get_mut("tall box") {
                tall.euler_angles.y = 20.0 + angle;
            }
        }
        ScenePreset::Showcase => {
            if let Some(torus) = scene.get_mut("torus") {
                torus.euler_angles.z = angle;
            }
            if let Some(cube) = scene.get_mut("cube") {
                cube.euler_angles.y = 30.0 + angle;
            }
        }
        ScenePreset::Orbit => {
            if let Some(model) = scene.get_mut("model") {
                model.euler_angles.y = angle;
            }
            if let Some(light) = scene.get_mut("orbiter") {
                let rad = (angle * 2.0).to_radians();
                light.position = Vector3::new(3.0 * rad.sin(), 1.5, 3.0 * rad.cos());
            }
        }
    }
}

fn frame_path(output: &str, frame: usize, frames: usize) -> String {
    if frames == 1 {
        return output.to_string();
    }
    let path = Path::new(output);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("png");
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => format!("{}/{}_{:04}.{}", dir.display(), stem, frame, ext),
        None => format!("{}_{:04}.{}", stem, frame, ext),
    }
}
