//! Full redraw of the simulated map.
//!
//! Draws back to front: ocean, land, point markers, then the trajectory. Line
//! widths and marker sizes are divided by the zoom so they keep a constant
//! on-screen size under the scaled view transform.

use super::{colors, Surface};
use crate::geo::{GeographyFeature, Projector};
use crate::map::ViewState;
use crate::state::Point;
use eframe::egui::{Pos2, Rect, Stroke};

/// Marker radius in screen pixels.
pub const MARKER_RADIUS: f32 = 8.0;
/// Marker outline width in screen pixels.
pub const MARKER_OUTLINE_WIDTH: f32 = 2.0;
/// Ordinal label size in screen pixels.
pub const LABEL_SIZE: f32 = 10.0;
/// Land outline width in screen pixels.
pub const BORDER_WIDTH: f32 = 0.5;
/// Trajectory line width in screen pixels.
pub const TRAJECTORY_WIDTH: f32 = 3.0;

/// Redraws the whole scene onto `surface`.
///
/// Only the surface is mutated. An empty feature slice draws ocean only, and
/// fewer than two points skip the trajectory.
pub fn render_scene(
    surface: &mut dyn Surface,
    features: &[GeographyFeature],
    points: &[Point],
    view: &ViewState,
) {
    let size = surface.logical_size();
    let projector = Projector::new(size);
    let zoom = view.zoom;

    surface.clear();
    surface.set_transform(view.canvas_transform());

    surface.fill_rect(Rect::from_min_size(Pos2::ZERO, size), colors::map::OCEAN);

    let border = Stroke::new(BORDER_WIDTH / zoom, colors::map::BORDER);
    let mut ring_buf: Vec<Pos2> = Vec::new();
    for feature in features {
        for ring in feature.rings() {
            if ring.len() < 3 {
                continue;
            }
            ring_buf.clear();
            ring_buf.extend(ring.iter().map(|c| projector.project_coord(*c)));
            surface.polygon(&ring_buf, colors::map::LAND, border);
        }
    }

    let projected: Vec<Pos2> = points
        .iter()
        .map(|p| projector.project(p.lat, p.lng))
        .collect();

    let outline = Stroke::new(MARKER_OUTLINE_WIDTH / zoom, colors::map::MARKER_OUTLINE);
    for (i, pos) in projected.iter().enumerate() {
        surface.circle(*pos, MARKER_RADIUS / zoom, colors::map::MARKER, outline);
        surface.text(
            *pos,
            &(i + 1).to_string(),
            LABEL_SIZE / zoom,
            colors::map::MARKER_LABEL,
        );
    }

    if projected.len() >= 2 {
        surface.polyline(
            &projected,
            Stroke::new(TRAJECTORY_WIDTH / zoom, colors::map::TRAJECTORY),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Affine;
    use crate::render::{DisplayList, DrawCommand, RasterSurface};
    use eframe::egui::Vec2;
    use geo_types::Coord;

    const SIZE: Vec2 = Vec2::new(800.0, 520.0);

    fn points(coords: &[(f64, f64)]) -> Vec<Point> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Point {
                id: i as u64 + 1,
                name: format!("P{}", i + 1),
                lat,
                lng,
            })
            .collect()
    }

    fn square(lng: f64, lat: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            Coord { x: lng, y: lat },
            Coord { x: lng + size, y: lat },
            Coord {
                x: lng + size,
                y: lat + size,
            },
            Coord { x: lng, y: lat + size },
            Coord { x: lng, y: lat },
        ]
    }

    #[test]
    fn test_empty_features_three_points() {
        let mut list = DisplayList::new(SIZE);
        let view = ViewState::new(SIZE);
        let pts = points(&[(0.0, 0.0), (10.0, 10.0), (-20.0, 40.0)]);

        render_scene(&mut list, &[], &pts, &view);

        let commands = list.commands();
        assert_eq!(commands[0], DrawCommand::Clear);
        assert_eq!(commands[1], DrawCommand::SetTransform(Affine::IDENTITY));
        assert!(matches!(
            commands[2],
            DrawCommand::FillRect { color, .. } if color == colors::map::OCEAN
        ));
        assert_eq!(list.polygons().count(), 0);
        assert_eq!(list.circles().count(), 3);
        assert_eq!(list.texts(), vec!["1", "2", "3"]);
        assert_eq!(list.polylines().count(), 1);

        match list.polylines().next() {
            Some(DrawCommand::Polyline { points, stroke }) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0], Pos2::new(400.0, 260.0));
                assert_eq!(stroke.color, colors::map::TRAJECTORY);
            }
            other => panic!("unexpected {:?}", other),
        };
    }

    #[test]
    fn test_trajectory_drawn_last() {
        let mut list = DisplayList::new(SIZE);
        let view = ViewState::new(SIZE);
        render_scene(&mut list, &[], &points(&[(1.0, 1.0), (2.0, 2.0)]), &view);
        assert!(matches!(
            list.commands().last(),
            Some(DrawCommand::Polyline { .. })
        ));
    }

    #[test]
    fn test_single_point_skips_trajectory() {
        let mut list = DisplayList::new(SIZE);
        let view = ViewState::new(SIZE);
        render_scene(&mut list, &[], &points(&[(5.0, 5.0)]), &view);
        assert_eq!(list.circles().count(), 1);
        assert_eq!(list.polylines().count(), 0);

        render_scene(&mut list, &[], &[], &view);
        assert_eq!(list.circles().count(), 0);
        assert_eq!(list.texts().len(), 0);
    }

    #[test]
    fn test_every_ring_is_drawn() {
        let features = vec![
            GeographyFeature::Polygon {
                rings: vec![square(0.0, 0.0, 10.0)],
                label: None,
            },
            GeographyFeature::MultiPolygon {
                polygons: vec![
                    vec![square(20.0, 20.0, 5.0), square(21.0, 21.0, 1.0)],
                    vec![square(-60.0, -30.0, 8.0)],
                ],
                label: Some("Islands".to_string()),
            },
        ];
        let mut list = DisplayList::new(SIZE);
        render_scene(&mut list, &features, &[], &ViewState::new(SIZE));

        assert_eq!(list.polygons().count(), 4);
        for polygon in list.polygons() {
            if let DrawCommand::Polygon { ring, fill, .. } = polygon {
                assert_eq!(ring.len(), 5);
                assert_eq!(*fill, colors::map::LAND);
            }
        }
    }

    #[test]
    fn test_sizes_compensate_for_zoom() {
        let mut view = ViewState::new(SIZE);
        view.apply_zoom(4.0, view.center());
        let features = vec![GeographyFeature::Polygon {
            rings: vec![square(0.0, 0.0, 10.0)],
            label: None,
        }];
        let mut list = DisplayList::new(SIZE);
        render_scene(
            &mut list,
            &features,
            &points(&[(0.0, 0.0), (1.0, 1.0)]),
            &view,
        );

        for command in list.commands() {
            match command {
                DrawCommand::Circle { radius, stroke, .. } => {
                    assert_eq!(*radius, MARKER_RADIUS / 4.0);
                    assert_eq!(stroke.width, MARKER_OUTLINE_WIDTH / 4.0);
                }
                DrawCommand::Polygon { stroke, .. } => {
                    assert_eq!(stroke.width, BORDER_WIDTH / 4.0)
                }
                DrawCommand::Polyline { stroke, .. } => {
                    assert_eq!(stroke.width, TRAJECTORY_WIDTH / 4.0)
                }
                DrawCommand::Text { size, .. } => assert_eq!(*size, LABEL_SIZE / 4.0),
                _ => {}
            }
        }
    }

    #[test]
    fn test_render_does_not_mutate_view() {
        let mut view = ViewState::new(SIZE);
        view.apply_pan(Vec2::new(12.0, -7.0));
        let before = view.clone();
        let mut list = DisplayList::new(SIZE);
        render_scene(&mut list, &[], &points(&[(0.0, 0.0)]), &view);
        assert_eq!(view, before);
    }

    #[test]
    fn test_raster_render_is_idempotent() {
        let features = vec![GeographyFeature::Polygon {
            rings: vec![square(-10.0, -10.0, 30.0)],
            label: None,
        }];
        let pts = points(&[(0.0, 0.0), (20.0, 30.0), (-15.0, 60.0)]);
        let mut view = ViewState::new(SIZE);
        view.apply_zoom(1.2, Pos2::new(300.0, 200.0));

        let mut surface = RasterSurface::new(SIZE, 1.0).unwrap();
        render_scene(&mut surface, &features, &pts, &view);
        let first = surface.pixmap().data().to_vec();
        render_scene(&mut surface, &features, &pts, &view);
        render_scene(&mut surface, &features, &pts, &view);

        assert_eq!(first, surface.pixmap().data());
    }

    #[test]
    fn test_raster_shows_ocean_marker_and_no_land() {
        let pts = points(&[(0.0, 0.0), (0.0, 90.0), (45.0, -90.0)]);
        let view = ViewState::new(SIZE);
        let mut surface = RasterSurface::new(SIZE, 1.0).unwrap();
        render_scene(&mut surface, &[], &pts, &view);

        let px = |x: u32, y: u32| {
            let c = surface.pixmap().pixel(x, y).unwrap().demultiply();
            [c.red(), c.green(), c.blue()]
        };
        let ocean = colors::map::OCEAN.to_srgba_unmultiplied();
        assert_eq!(px(20, 500), [ocean[0], ocean[1], ocean[2]]);

        // Marker 1 sits at (400, 260); sample inside the disc but off the label.
        let marker = colors::map::MARKER.to_srgba_unmultiplied();
        assert_eq!(px(394, 260), [marker[0], marker[1], marker[2]]);

        let land = colors::map::LAND.to_srgba_unmultiplied();
        let has_land = surface
            .pixmap()
            .pixels()
            .iter()
            .any(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue()] == [land[0], land[1], land[2]]
            });
        assert!(!has_land);
    }
}
