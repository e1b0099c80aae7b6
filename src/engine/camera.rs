/// Camera model: look-at view matrix construction and 3D -> 2D projection.

use crate::engine::canvas::Canvas2D;
use crate::engine::types::{Circle, ColoredPoint};
use crate::error::Result;
use crate::math::{Matrix, Vector};

/// Inputs of a look-at transform.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewMatrixBuilder {
    pub camera_position: Vector,
    pub focal_point: Vector,
    pub up: Vector,
    pub column_major: bool,
}

impl Default for ViewMatrixBuilder {
    fn default() -> Self {
        Self {
            camera_position: Vector::from_xyz(0.0, 0.0, 10.0),
            focal_point: Vector::zeros(3),
            up: Vector::from_xyz(0.0, 1.0, 0.0),
            column_major: false,
        }
    }
}

impl ViewMatrixBuilder {
    pub fn new(camera_position: Vector, focal_point: Vector, up: Vector) -> Self {
        Self { camera_position, focal_point, up, column_major: false }
    }

    /// 4x4 view matrix. Never fails; a camera on its focal point gives a
    /// degenerate basis that projects everything onto the camera axis.
    pub fn build(&self) -> Matrix {
        let mut m = Matrix::identity(4);
        m.set_look_at_matrix(&self.camera_position, &self.focal_point, &self.up, self.column_major);
        m
    }

    pub fn projector(&self) -> Projector {
        Projector::new(self.build())
    }
}

/// Applies a view matrix to world points.
#[derive(Clone, Debug, PartialEq)]
pub struct Projector {
    view: Matrix,
}

impl Projector {
    pub fn new(view: Matrix) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &Matrix {
        &self.view
    }

    /// Camera-space coordinates of `point`, same length as `point`.
    pub fn transform(&self, point: &Vector) -> Result<Vector> {
        let mut out = point.clone();
        self.view.transform_on_right(&mut out)?;
        Ok(out)
    }

    /// Drawing-plane `(x, y)` of `point`; depth is discarded.
    pub fn project(&self, point: &Vector) -> Result<(f64, f64)> {
        let p = self.transform(point)?;
        Ok((p.x(), p.y()))
    }
}

/// Draws 3D primitives through a [`Projector`] onto a canvas.
#[derive(Clone, Debug)]
pub struct Renderer3D {
    pub projector: Projector,
}

impl Renderer3D {
    pub fn new(projector: Projector) -> Self {
        Self { projector }
    }

    pub fn draw_colored_point<C: Canvas2D + ?Sized>(&self, canvas: &mut C, p: &ColoredPoint) -> Result<()> {
        let (x, y) = self.projector.project(&p.point)?;
        canvas.draw_point(x, y, &p.color);
        Ok(())
    }

    /// Projects the centre only; the radius is drawn unscaled.
    pub fn draw_circle<C: Canvas2D + ?Sized>(&self, canvas: &mut C, circle: &Circle) -> Result<()> {
        let (x, y) = self.projector.project(&circle.center)?;
        canvas.draw_circle(x, y, circle.radius, &circle.color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::canvas::RecordingCanvas;
    use crate::engine::types::{Color, DrawCommand};
    use std::f64::consts::PI;

    fn project_from(camera: Vector, focal: Vector, up: Vector, point: Vector) -> (f64, f64) {
        ViewMatrixBuilder::new(camera, focal, up).projector().project(&point).unwrap()
    }

    #[test]
    fn test_sphere_sweep_projects_axis_point_to_origin() {
        let up = Vector::from_xyz(0.0, 0.0, 1.0);
        let step = PI / 24.0;
        let mut longitude = 0.0;
        while longitude <= 2.0 * PI {
            let mut latitude = -PI / 2.0;
            while latitude <= PI / 2.0 + 1e-12 {
                let dir = Vector::from_xyz(
                    latitude.cos() * longitude.cos(),
                    latitude.cos() * longitude.sin(),
                    latitude.sin(),
                );
                let camera = dir.scaled(2.0);
                let point = dir.scaled(1.0);
                let (x, y) = project_from(camera, Vector::zeros(3), up.clone(), point);
                assert!(x.abs() < 1e-4 && y.abs() < 1e-4, "lon {longitude} lat {latitude}: ({x}, {y})");
                latitude += step;
            }
            longitude += step;
        }
    }

    #[test]
    fn test_camera_on_focal_point_projects_to_origin() {
        let up = Vector::from_xyz(0.0, 0.0, 1.0);
        for point in [Vector::from_xyz(1.0, 2.0, 3.0), Vector::from_xyz(-5.0, 0.0, 7.5)] {
            let (x, y) = project_from(Vector::zeros(3), Vector::zeros(3), up.clone(), point);
            assert_eq!((x, y), (0.0, 0.0));
        }
    }

    #[test]
    fn test_axis_cameras() {
        let up = Vector::from_xyz(0.0, 0.0, 1.0);
        let cases = [
            (Vector::from_xyz(10.0, 0.0, 0.0), Vector::from_xyz(5.0, 0.0, 0.0)),
            (Vector::from_xyz(0.0, 10.0, 0.0), Vector::from_xyz(0.0, 5.0, 0.0)),
            (Vector::from_xyz(-10.0, 0.0, 0.0), Vector::from_xyz(-5.0, 0.0, 0.0)),
            (Vector::from_xyz(0.0, -10.0, 0.0), Vector::from_xyz(0.0, -5.0, 0.0)),
        ];
        for (camera, point) in cases {
            let (x, y) = project_from(camera, Vector::zeros(3), up.clone(), point);
            assert!(x.abs() < 1e-10 && y.abs() < 1e-10);
        }
    }

    #[test]
    fn test_offset_point_keeps_screen_axes() {
        // camera on +x looking at origin: world +y is screen right, world +z is screen up
        let up = Vector::from_xyz(0.0, 0.0, 1.0);
        let camera = Vector::from_xyz(10.0, 0.0, 0.0);
        let (x, y) = project_from(camera.clone(), Vector::zeros(3), up.clone(), Vector::from_xyz(0.0, 1.0, 0.0));
        assert!((x - 1.0).abs() < 1e-10 && y.abs() < 1e-10);
        let (x, y) = project_from(camera, Vector::zeros(3), up, Vector::from_xyz(0.0, 0.0, 2.0));
        assert!(x.abs() < 1e-10 && (y - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_renderer_draws_projected() {
        let renderer = Renderer3D::new(ViewMatrixBuilder::default().projector());
        let mut canvas = RecordingCanvas::new(10, 10);
        let p = ColoredPoint::new(Vector::from_xyz(1.0, 2.0, 0.0), Color::new("red"));
        renderer.draw_colored_point(&mut canvas, &p).unwrap();
        let c = Circle { center: Vector::from_xyz(-1.0, 0.5, 3.0), radius: 0.25, color: Color::white() };
        renderer.draw_circle(&mut canvas, &c).unwrap();
        assert_eq!(
            canvas.commands,
            vec![
                DrawCommand::Point { x: 1.0, y: 2.0, color: Color::new("red") },
                DrawCommand::Circle { x: -1.0, y: 0.5, radius: 0.25, color: Color::white() },
            ]
        );
    }

    #[test]
    fn test_projecting_2d_point_against_4x4_fails() {
        let projector = ViewMatrixBuilder::default().projector();
        assert!(projector.project(&Vector::from_xy(1.0, 1.0)).is_err());
    }
}
