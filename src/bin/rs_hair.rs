// command line options
use clap::Parser;
// hair
use rs_hair::accelerators::hbvh::{CurveGroup, HairBvh};
use rs_hair::accelerators::traverse::intersect_group;
use rs_hair::blockqueue::BlockQueue;
use rs_hair::cameras::{read_camera_path, CameraConfig, PerspectiveView};
use rs_hair::core::common::Float;
use rs_hair::core::geometry::{Point3f, Ray, RayPacket, Vector3f, RAY_PACKET_SIZE};
use rs_hair::core::rng::Rng;
use rs_hair::shapes::fiber::{CurveSegment, CurveStore};
// std
use std::path::PathBuf;
use std::sync::Arc;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const TILE_SIZE: u32 = 16;

/// Trace a procedural fiber patch and write depth images.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// use specified number of threads for rendering
    #[arg(short = 't', long = "nthreads", default_value_t = 0)]
    nthreads: u8,
    /// camera type
    #[arg(short = 'c', long = "camera", default_value = "perspective")]
    camera: String,
    /// view file holding -vp/-vi/-vu/-fv tokens
    #[arg(short = 'v', long = "view")]
    view: Option<PathBuf>,
    /// camera position
    #[arg(long = "eye", num_args = 3, allow_negative_numbers = true)]
    eye: Option<Vec<Float>>,
    /// point the camera looks at
    #[arg(long = "gaze", num_args = 3, allow_negative_numbers = true)]
    gaze: Option<Vec<Float>>,
    /// camera up vector
    #[arg(long = "up", num_args = 3, allow_negative_numbers = true)]
    up: Option<Vec<Float>>,
    /// vertical field of view in degrees
    #[arg(long = "fovy")]
    fovy: Option<Float>,
    /// camera path file, one viewpoint per line
    #[arg(long = "camerafile")]
    camerafile: Option<PathBuf>,
    /// number of camera path frames to render
    #[arg(long = "cameracount")]
    cameracount: Option<usize>,
    /// number of fibers in the procedural patch
    #[arg(long = "fibers", default_value_t = 400)]
    fibers: usize,
    /// image width
    #[arg(long = "width", default_value_t = 640)]
    width: u32,
    /// image height
    #[arg(long = "height", default_value_t = 480)]
    height: u32,
    /// output file name; camera path frames get a frame suffix
    #[arg(short = 'o', long = "output", default_value = "hair.png")]
    output: PathBuf,
}

/// A little lawn of fibers rooted on the xz unit square, arcing up
/// and leaning in jittered directions, each one a single cubic
/// segment with a tapering radius.
fn fiber_patch(n_fibers: usize) -> Arc<CurveStore> {
    let mut rng: Rng = Rng::new();
    rng.set_sequence(1234_u64);
    let side: usize = (n_fibers as Float).sqrt().ceil() as usize;
    let mut segments: Vec<CurveSegment> = Vec::with_capacity(n_fibers);
    for i in 0..n_fibers {
        let gx: Float = (i % side) as Float / side as Float;
        let gz: Float = (i / side) as Float / side as Float;
        let root: Point3f = Point3f {
            x: gx + rng.uniform_float_in(0.0, 1.0 / side as Float),
            y: 0.0,
            z: gz + rng.uniform_float_in(0.0, 1.0 / side as Float),
        };
        let lean_x: Float = rng.uniform_float_in(-0.2, 0.2);
        let lean_z: Float = rng.uniform_float_in(-0.2, 0.2);
        let p: [Point3f; 4] = [
            root,
            Point3f {
                x: root.x + 0.1 * lean_x,
                y: 0.35,
                z: root.z + 0.1 * lean_z,
            },
            Point3f {
                x: root.x + 0.4 * lean_x,
                y: 0.65,
                z: root.z + 0.4 * lean_z,
            },
            Point3f {
                x: root.x + lean_x,
                y: rng.uniform_float_in(0.75, 0.9),
                z: root.z + lean_z,
            },
        ];
        segments.push(CurveSegment::new(&p, &[0.004, 0.003, 0.002, 0.001]));
    }
    Arc::new(CurveStore::new(segments))
}

/// Four curve groups over the patch, each with its own flat index.
fn build_bvh(store: Arc<CurveStore>) -> HairBvh {
    let ids: Vec<u32> = (0..store.len() as u32).collect();
    let group_len: usize = ((ids.len() + 3) / 4).max(1);
    let groups: Vec<CurveGroup> = ids
        .chunks(group_len)
        .map(|chunk| CurveGroup::pack_flat(store.clone(), chunk))
        .collect();
    HairBvh::new(groups)
}

/// Trace every pixel and return the per-pixel hit depth (infinity
/// where nothing was hit).
fn render_depth(
    bvh: &HairBvh,
    view: &PerspectiveView,
    width: u32,
    height: u32,
    num_cores: usize,
) -> Vec<Float> {
    let mut film: Vec<Float> = vec![std::f32::INFINITY; (width * height) as usize];
    let queue: BlockQueue = BlockQueue::new((width, height), (TILE_SIZE, TILE_SIZE));
    let mut pb: pbr::ProgressBar<std::io::Stdout> = pbr::ProgressBar::new(queue.len() as u64);
    let bq = &queue;
    crossbeam::scope(|scope| {
        let (tile_tx, tile_rx) = crossbeam_channel::bounded(num_cores);
        for _ in 0..num_cores {
            let tile_tx = tile_tx.clone();
            scope.spawn(move |_| {
                while let Some((tile_x, tile_y)) = bq.next() {
                    let x0: u32 = tile_x * TILE_SIZE;
                    let y0: u32 = tile_y * TILE_SIZE;
                    let x1: u32 = (x0 + TILE_SIZE).min(width);
                    let y1: u32 = (y0 + TILE_SIZE).min(height);
                    let mut depths: Vec<Float> =
                        Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);
                    for y in y0..y1 {
                        let mut x: u32 = x0;
                        while x < x1 {
                            let lanes: usize = ((x1 - x) as usize).min(RAY_PACKET_SIZE);
                            let mut rays: [Ray; RAY_PACKET_SIZE] =
                                [Ray::default(); RAY_PACKET_SIZE];
                            for lane in 0..lanes {
                                rays[lane] = view.generate_ray(
                                    (x + lane as u32) as Float + 0.5,
                                    y as Float + 0.5,
                                );
                            }
                            let mut packet: RayPacket = RayPacket::new(rays);
                            packet.active = ((1_u16 << lanes) - 1) as u8;
                            for item in 0..bvh.groups.len() {
                                intersect_group(packet.active, bvh, &mut packet, item);
                            }
                            for lane in 0..lanes {
                                let ray: &Ray = &packet.rays[lane];
                                if ray.prim_id.is_some() {
                                    depths.push(ray.t_far);
                                } else {
                                    depths.push(std::f32::INFINITY);
                                }
                            }
                            x += lanes as u32;
                        }
                    }
                    // send the finished tile to the main thread
                    tile_tx
                        .send((x0, y0, x1, y1, depths))
                        .expect("tile channel closed");
                }
            });
        }
        drop(tile_tx);
        for (x0, y0, x1, y1, depths) in tile_rx.iter() {
            let mut i: usize = 0;
            for y in y0..y1 {
                for x in x0..x1 {
                    film[(y * width + x) as usize] = depths[i];
                    i += 1;
                }
            }
            pb.inc();
        }
    })
    .expect("render threads panicked");
    pb.finish_print("");
    film
}

/// Map hit depths onto an 8-bit grayscale image, near hits bright.
fn write_depth_image(film: &[Float], width: u32, height: u32, filename: &str) {
    let mut near: Float = std::f32::INFINITY;
    let mut far: Float = 0.0;
    for depth in film.iter() {
        if depth.is_finite() {
            near = near.min(*depth);
            far = far.max(*depth);
        }
    }
    let range: Float = if far > near { far - near } else { 1.0 };
    let image = image::GrayImage::from_fn(width, height, |x, y| {
        let depth: Float = film[(y * width + x) as usize];
        if depth.is_finite() {
            let t: Float = (depth - near) / range;
            image::Luma([(255.0 - t * 191.0) as u8])
        } else {
            image::Luma([0_u8])
        }
    });
    image.save(filename).expect("failed to write image");
    println!("Wrote {}", filename);
}

fn frame_filename(output: &PathBuf, frame: usize) -> String {
    let stem: &str = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("hair");
    let parent: PathBuf = output
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(PathBuf::new);
    let name: String = format!("{}_{:04}.png", stem, frame);
    String::from(parent.join(name).to_str().unwrap())
}

fn main() {
    let args: Cli = Cli::parse();
    let num_cores: usize = if args.nthreads == 0_u8 {
        num_cpus::get()
    } else {
        args.nthreads as usize
    };
    println!("rs_hair version {} [Detected {} cores]", VERSION, num_cores);
    // camera, starting from a viewpoint that frames the patch
    let mut config: CameraConfig = CameraConfig {
        camera_type: args.camera.clone(),
        eye: Point3f {
            x: 0.5,
            y: 0.7,
            z: 2.4,
        },
        gaze: Point3f {
            x: 0.5,
            y: 0.4,
            z: 0.0,
        },
        up: Vector3f {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        },
        fovy: 40.0,
    };
    if config.camera_type != "perspective" {
        println!(
            "WARNING: camera type {:?} unknown. Using \"perspective\".",
            config.camera_type
        );
    }
    if let Some(ref view) = args.view {
        config.read_view_file(view.to_str().unwrap());
    }
    if let Some(ref eye) = args.eye {
        config.eye = Point3f {
            x: eye[0],
            y: eye[1],
            z: eye[2],
        };
    }
    if let Some(ref gaze) = args.gaze {
        config.gaze = Point3f {
            x: gaze[0],
            y: gaze[1],
            z: gaze[2],
        };
    }
    if let Some(ref up) = args.up {
        config.up = Vector3f {
            x: up[0],
            y: up[1],
            z: up[2],
        };
    }
    if let Some(fovy) = args.fovy {
        config.fovy = fovy;
    }
    // scene
    let store: Arc<CurveStore> = fiber_patch(args.fibers);
    let bvh: HairBvh = build_bvh(store.clone());
    println!(
        "Tracing {} fibers in {} curve groups ...",
        store.len(),
        bvh.groups.len()
    );
    let output: String = String::from(args.output.to_str().unwrap());
    if let Some(ref camerafile) = args.camerafile {
        let path = read_camera_path(camerafile.to_str().unwrap());
        if path.is_empty() {
            panic!("Camera path {:?} holds no positions", camerafile);
        }
        let n_frames: usize = path.len().min(args.cameracount.unwrap_or(path.len()));
        for frame in 0..n_frames {
            let frame_config: CameraConfig = path.config_for_frame(frame, &config);
            let view: PerspectiveView =
                PerspectiveView::new(&frame_config, args.width as usize, args.height as usize);
            let film: Vec<Float> =
                render_depth(&bvh, &view, args.width, args.height, num_cores);
            write_depth_image(
                &film,
                args.width,
                args.height,
                &frame_filename(&args.output, frame),
            );
        }
    } else {
        let view: PerspectiveView =
            PerspectiveView::new(&config, args.width as usize, args.height as usize);
        let film: Vec<Float> = render_depth(&bvh, &view, args.width, args.height, num_cores);
        write_depth_image(&film, args.width, args.height, &output);
    }
}
