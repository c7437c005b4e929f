//! Camera configuration and the two plain-text camera file formats.
//!
//! A *view file* holds a single viewpoint as `-vp`/`-vi`/`-vu`/`-fv`
//! tokens. A *camera path file* holds one viewpoint per line as bare
//! whitespace-separated floats; lines starting with `#` are comments.
//! Column meaning in a path file is decided purely by how many
//! numbers a line carries: more than 3 gives a position, more than 6
//! a direction target (the direction is derived later as target
//! minus position), more than 8 an up vector, more than 9 a field of
//! view. Malformed numeric tokens parse as zero; there is no strict
//! validation of path data. An unreadable file or an unrecognized
//! view-file token, on the other hand, is fatal before any rendering
//! starts.

// std
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::str::SplitWhitespace;
// hair
use crate::core::common::{radians, Float};
use crate::core::geometry::{vec3_cross_vec3, Point3f, Ray, Vector3f};

/// A single camera viewpoint plus the camera type name handed through
/// from the command line.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub camera_type: String,
    pub eye: Point3f,
    pub gaze: Point3f,
    pub up: Vector3f,
    pub fovy: Float,
}

impl Default for CameraConfig {
    fn default() -> CameraConfig {
        CameraConfig {
            camera_type: String::from("perspective"),
            eye: Point3f::default(),
            gaze: Point3f {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
            up: Vector3f {
                x: 0.0,
                y: 1.0,
                z: 0.0,
            },
            fovy: 60.0 as Float,
        }
    }
}

fn next_float(tokens: &mut SplitWhitespace) -> Float {
    match tokens.next() {
        Some(token) => token.parse::<Float>().unwrap_or(0.0 as Float),
        None => 0.0 as Float,
    }
}

fn next_point(tokens: &mut SplitWhitespace) -> Point3f {
    Point3f {
        x: next_float(tokens),
        y: next_float(tokens),
        z: next_float(tokens),
    }
}

impl CameraConfig {
    /// Read a `-vp`/`-vi`/`-vu`/`-fv` view file into this
    /// configuration. An unreadable path or an unrecognized control
    /// token is fatal.
    pub fn read_view_file(&mut self, filename: &str) {
        let mut file: File = File::open(filename)
            .unwrap_or_else(|_| panic!("Failed to open {:?} for reading", filename));
        let mut contents: String = String::new();
        file.read_to_string(&mut contents)
            .unwrap_or_else(|_| panic!("Failed to read {:?}", filename));
        let mut tokens: SplitWhitespace = contents.split_whitespace();
        while let Some(token) = tokens.next() {
            match token {
                "-vp" => self.eye = next_point(&mut tokens),
                "-vi" => self.gaze = next_point(&mut tokens),
                "-vu" => {
                    let p: Point3f = next_point(&mut tokens);
                    self.up = Vector3f {
                        x: p.x,
                        y: p.y,
                        z: p.z,
                    };
                }
                "-fv" => self.fovy = next_float(&mut tokens),
                _ => panic!("Unrecognized token {:?} in view file {:?}", token, filename),
            }
        }
    }
    pub fn direction(&self) -> Vector3f {
        self.gaze - self.eye
    }
}

/// Per-frame camera data read from a camera path file. Directions are
/// already converted from targets (target minus position).
#[derive(Debug, Default, Clone)]
pub struct CameraPath {
    pub positions: Vec<Point3f>,
    pub directions: Vec<Vector3f>,
    pub ups: Vec<Vector3f>,
    pub fovs: Vec<Float>,
}

impl CameraPath {
    pub fn len(&self) -> usize {
        self.positions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
    /// Viewpoint for one frame; fields a line did not provide fall
    /// back to `base`.
    pub fn config_for_frame(&self, frame: usize, base: &CameraConfig) -> CameraConfig {
        let mut config: CameraConfig = base.clone();
        config.eye = self.positions[frame];
        if frame < self.directions.len() {
            let d: Vector3f = self.directions[frame];
            config.gaze = config.eye + d;
        }
        if frame < self.ups.len() {
            config.up = self.ups[frame];
        }
        if frame < self.fovs.len() {
            config.fovy = self.fovs[frame];
        }
        config
    }
}

fn parse_line(line: &str) -> Vec<Float> {
    line.split_whitespace()
        .map(|token| token.parse::<Float>().unwrap_or(0.0 as Float))
        .collect()
}

/// Read a camera path file. Column semantics are by count only; see
/// the module documentation.
pub fn read_camera_path(filename: &str) -> CameraPath {
    let file: File = File::open(filename)
        .unwrap_or_else(|_| panic!("Failed to open {:?} for reading", filename));
    let reader: BufReader<File> = BufReader::new(file);
    let mut path: CameraPath = CameraPath::default();
    for line_result in reader.lines() {
        let line: String =
            line_result.unwrap_or_else(|_| panic!("Failed to read {:?}", filename));
        if line.starts_with('#') {
            continue;
        }
        let elems: Vec<Float> = parse_line(&line);
        if elems.len() > 3 {
            path.positions.push(Point3f {
                x: elems[0],
                y: elems[1],
                z: elems[2],
            });
        }
        if elems.len() > 6 {
            path.directions.push(Vector3f {
                x: elems[3],
                y: elems[4],
                z: elems[5],
            });
        }
        if elems.len() > 8 {
            path.ups.push(Vector3f {
                x: elems[6],
                y: elems[7],
                z: elems[8],
            });
        }
        if elems.len() > 9 {
            path.fovs.push(elems[9]);
        }
    }
    // targets become directions
    for frame in 0..path.positions.len().min(path.directions.len()) {
        path.directions[frame] = path.directions[frame]
            - Vector3f {
                x: path.positions[frame].x,
                y: path.positions[frame].y,
                z: path.positions[frame].z,
            };
    }
    path
}

/// Perspective projection over an image plane, resolved from a
/// [CameraConfig](struct.CameraConfig.html) and an image resolution.
#[derive(Debug, Clone)]
pub struct PerspectiveView {
    pub eye: Point3f,
    dir: Vector3f,
    right: Vector3f,
    up: Vector3f,
    half_width: Float,
    half_height: Float,
    x_res: usize,
    y_res: usize,
}

impl PerspectiveView {
    pub fn new(config: &CameraConfig, x_res: usize, y_res: usize) -> PerspectiveView {
        let dir: Vector3f = config.direction().normalize();
        let right: Vector3f = vec3_cross_vec3(&dir, &config.up).normalize();
        let up: Vector3f = vec3_cross_vec3(&right, &dir);
        let half_height: Float = (radians(config.fovy) * 0.5).tan();
        let half_width: Float = half_height * x_res as Float / y_res as Float;
        PerspectiveView {
            eye: config.eye,
            dir,
            right,
            up,
            half_width,
            half_height,
            x_res,
            y_res,
        }
    }
    /// Ray through continuous image coordinates (px, py); (0, 0) is
    /// the upper left corner.
    pub fn generate_ray(&self, px: Float, py: Float) -> Ray {
        let sx: Float = (2.0 as Float * px / self.x_res as Float - 1.0) * self.half_width;
        let sy: Float = (1.0 as Float - 2.0 * py / self.y_res as Float) * self.half_height;
        let d: Vector3f = (self.dir + self.right * sx + self.up * sy).normalize();
        Ray::new(self.eye, d)
    }
}
