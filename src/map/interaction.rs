//! Pointer, wheel and button input for the simulated map.
//!
//! Events arrive already converted to logical canvas pixels. Every handler
//! runs to completion synchronously on the UI thread.

use super::view::ViewState;
use eframe::egui::{self, Pos2, Rect};

/// Zoom factor for one wheel notch up or one press of the zoom-in button.
pub const ZOOM_IN_FACTOR: f32 = 1.2;
/// Zoom factor for one wheel notch down or one press of the zoom-out button.
pub const ZOOM_OUT_FACTOR: f32 = 0.8;

/// Wheel direction, independent of the platform's delta sign convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Input event on the map canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up,
    Leave,
    Wheel { direction: WheelDirection, pos: Pos2 },
    ZoomIn,
    ZoomOut,
    Reset,
}

/// Translates input events into view updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractionController;

impl InteractionController {
    pub fn new() -> Self {
        Self
    }

    /// Applies an event to the view. Returns true if zoom or pan changed.
    pub fn handle(&self, view: &mut ViewState, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down(pos) => {
                view.dragging = true;
                view.last_pointer = pos;
                false
            }
            PointerEvent::Move(pos) => {
                if !view.dragging {
                    return false;
                }
                let delta = pos - view.last_pointer;
                view.last_pointer = pos;
                if delta == egui::Vec2::ZERO {
                    return false;
                }
                view.apply_pan(delta);
                true
            }
            PointerEvent::Up | PointerEvent::Leave => {
                view.dragging = false;
                false
            }
            PointerEvent::Wheel { direction, pos } => {
                let factor = match direction {
                    WheelDirection::Up => ZOOM_IN_FACTOR,
                    WheelDirection::Down => ZOOM_OUT_FACTOR,
                };
                zoom_changed(view, factor, pos)
            }
            PointerEvent::ZoomIn => zoom_changed(view, ZOOM_IN_FACTOR, view.center()),
            PointerEvent::ZoomOut => zoom_changed(view, ZOOM_OUT_FACTOR, view.center()),
            PointerEvent::Reset => {
                let changed = view.zoom != 1.0 || view.pan_offset != egui::Vec2::ZERO;
                view.reset();
                changed
            }
        }
    }

    /// Collects the events produced by an egui canvas response this frame.
    ///
    /// Scroll input over the canvas is consumed so no surrounding widget
    /// scrolls while zooming.
    pub fn events_from_response(
        &self,
        response: &egui::Response,
        view: &ViewState,
        display_rect: Rect,
    ) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let to_logical = |pos: Pos2| view.screen_to_logical(pos, display_rect);

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(PointerEvent::Down(to_logical(pos)));
            }
        }

        // egui keeps reporting a drag outside the widget; the map ends it there
        let left = view.dragging && !response.contains_pointer();
        if left {
            events.push(PointerEvent::Leave);
        } else if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(PointerEvent::Move(to_logical(pos)));
            }
        }

        if response.drag_stopped() && !left {
            events.push(PointerEvent::Up);
        }

        if response.hovered() {
            let scroll_y = response.ctx.input_mut(|i| {
                let y = i.raw_scroll_delta.y;
                i.raw_scroll_delta = egui::Vec2::ZERO;
                i.smooth_scroll_delta = egui::Vec2::ZERO;
                y
            });
            if scroll_y != 0.0 {
                if let Some(pos) = response.hover_pos() {
                    // egui reports positive y when scrolling up
                    let direction = if scroll_y > 0.0 {
                        WheelDirection::Up
                    } else {
                        WheelDirection::Down
                    };
                    events.push(PointerEvent::Wheel {
                        direction,
                        pos: to_logical(pos),
                    });
                }
            }
        }

        if response.double_clicked() {
            events.push(PointerEvent::Reset);
        }

        events
    }
}

fn zoom_changed(view: &mut ViewState, factor: f32, anchor: Pos2) -> bool {
    let before = (view.zoom, view.pan_offset);
    view.apply_zoom(factor, anchor);
    before != (view.zoom, view.pan_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::Vec2;

    fn view() -> ViewState {
        ViewState::new(Vec2::new(800.0, 520.0))
    }

    #[test]
    fn test_pointer_down_only_records_anchor() {
        let controller = InteractionController::new();
        let mut view = view();

        let changed = controller.handle(&mut view, PointerEvent::Down(Pos2::new(10.0, 20.0)));

        assert!(!changed);
        assert!(view.dragging);
        assert_eq!(view.last_pointer, Pos2::new(10.0, 20.0));
        assert_eq!(view.pan_offset, Vec2::ZERO);
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let controller = InteractionController::new();
        let mut view = view();
        assert!(!controller.handle(&mut view, PointerEvent::Move(Pos2::new(50.0, 50.0))));
        assert_eq!(view.pan_offset, Vec2::ZERO);
    }

    #[test]
    fn test_drag_at_zoom_two_pans_by_half() {
        let controller = InteractionController::new();
        let mut view = view();
        view.apply_zoom(2.0, view.center());
        let before = view.pan_offset;

        controller.handle(&mut view, PointerEvent::Down(Pos2::new(100.0, 100.0)));
        assert!(controller.handle(&mut view, PointerEvent::Move(Pos2::new(140.0, 80.0))));
        controller.handle(&mut view, PointerEvent::Up);

        let delta = view.pan_offset - before;
        assert!((delta - Vec2::new(20.0, -10.0)).length() < 1e-4);
        assert!(!view.dragging);
    }

    #[test]
    fn test_drag_accumulates_from_last_position() {
        let controller = InteractionController::new();
        let mut view = view();

        controller.handle(&mut view, PointerEvent::Down(Pos2::new(0.0, 0.0)));
        controller.handle(&mut view, PointerEvent::Move(Pos2::new(10.0, 0.0)));
        controller.handle(&mut view, PointerEvent::Move(Pos2::new(25.0, 5.0)));

        assert!((view.pan_offset - Vec2::new(25.0, 5.0)).length() < 1e-4);
    }

    fn pointer_frame(
        ctx: &egui::Context,
        controller: &InteractionController,
        view: &mut ViewState,
        events: Vec<egui::Event>,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1200.0, 900.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default()
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    let (rect, response) =
                        ui.allocate_exact_size(view.canvas_size, egui::Sense::click_and_drag());
                    for event in controller.events_from_response(&response, view, rect) {
                        controller.handle(view, event);
                    }
                });
        });
    }

    fn press(pos: Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn test_drag_leaving_canvas_stops_panning() {
        let ctx = egui::Context::default();
        let controller = InteractionController::new();
        let mut view = view();

        let start = Pos2::new(100.0, 100.0);
        pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(start)]);
        pointer_frame(&ctx, &controller, &mut view, vec![press(start, true)]);
        let mut was_dragging = false;
        for pos in [Pos2::new(150.0, 130.0), Pos2::new(200.0, 160.0), Pos2::new(250.0, 190.0)] {
            pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(pos)]);
            was_dragging |= view.dragging;
        }
        assert!(was_dragging);
        let inside_offset = view.pan_offset;
        assert!(inside_offset != Vec2::ZERO);

        for pos in [Pos2::new(950.0, 700.0), Pos2::new(990.0, 780.0)] {
            pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(pos)]);
            assert!(!view.dragging);
            assert_eq!(view.pan_offset, inside_offset);
        }

        // Coming back with the button still held does not resume the drag
        let back = Pos2::new(300.0, 200.0);
        pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(back)]);
        pointer_frame(&ctx, &controller, &mut view, vec![press(back, false)]);
        assert!(!view.dragging);
        assert_eq!(view.pan_offset, inside_offset);
    }

    #[test]
    fn test_drag_release_inside_canvas() {
        let ctx = egui::Context::default();
        let controller = InteractionController::new();
        let mut view = view();

        let start = Pos2::new(400.0, 260.0);
        let end = Pos2::new(460.0, 300.0);
        pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(start)]);
        pointer_frame(&ctx, &controller, &mut view, vec![press(start, true)]);
        let step = Pos2::new(420.0, 270.0);
        pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(step)]);
        pointer_frame(&ctx, &controller, &mut view, vec![egui::Event::PointerMoved(end)]);
        pointer_frame(&ctx, &controller, &mut view, vec![press(end, false)]);
        pointer_frame(&ctx, &controller, &mut view, vec![]);

        assert!(!view.dragging);
        assert!(view.pan_offset.x > 0.0 && view.pan_offset.y > 0.0);
        assert!(view.pan_offset.x <= 60.0 + 1e-3 && view.pan_offset.y <= 40.0 + 1e-3);
    }

    #[test]
    fn test_leave_ends_drag() {
        let controller = InteractionController::new();
        let mut view = view();
        controller.handle(&mut view, PointerEvent::Down(Pos2::new(0.0, 0.0)));
        controller.handle(&mut view, PointerEvent::Leave);
        assert!(!view.dragging);
        assert!(!controller.handle(&mut view, PointerEvent::Move(Pos2::new(90.0, 0.0))));
    }

    #[test]
    fn test_wheel_uses_fixed_factors() {
        let controller = InteractionController::new();
        let mut view = view();
        let pos = Pos2::new(300.0, 200.0);

        controller.handle(
            &mut view,
            PointerEvent::Wheel {
                direction: WheelDirection::Up,
                pos,
            },
        );
        assert!((view.zoom - 1.2).abs() < 1e-6);

        controller.handle(
            &mut view,
            PointerEvent::Wheel {
                direction: WheelDirection::Down,
                pos,
            },
        );
        assert!((view.zoom - 0.96).abs() < 1e-5);
    }

    #[test]
    fn test_buttons_zoom_about_center() {
        let controller = InteractionController::new();
        let mut view = view();

        controller.handle(&mut view, PointerEvent::ZoomIn);
        assert!((view.zoom - 1.2).abs() < 1e-6);
        assert!(view.pan_offset.length() < 1e-5);

        controller.handle(&mut view, PointerEvent::ZoomOut);
        assert!(view.pan_offset.length() < 1e-5);
    }

    #[test]
    fn test_zoom_at_bound_reports_no_change() {
        let controller = InteractionController::new();
        let mut view = view();
        view.apply_zoom(100.0, view.center());
        assert!(!controller.handle(&mut view, PointerEvent::ZoomIn));
    }

    #[test]
    fn test_reset() {
        let controller = InteractionController::new();
        let mut view = view();
        controller.handle(&mut view, PointerEvent::ZoomIn);
        assert!(controller.handle(&mut view, PointerEvent::Reset));
        assert!(!controller.handle(&mut view, PointerEvent::Reset));
    }
}
