use crate::app::PredictorApp;
use crate::plot::{self, LOWERS_COLOR, RAISES_COLOR};

use eframe::egui::{self, Align2, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints};
use mrcurve::ParameterKind;

const BACKGROUND: Color32 = Color32::from_rgb(0xDB, 0xDB, 0xDB);
const ENTRY_FILL: Color32 = Color32::from_rgb(0xFC, 0xF8, 0xF8);
const PLOT_HEIGHT: f32 = 215.0;

/// Draws the whole window: inputs and ranges on top, buttons, then the two
/// plots side by side.
pub fn draw_central_panel(app: &mut PredictorApp, ctx: &egui::Context) {
    let frame = egui::Frame::central_panel(&ctx.style()).fill(BACKGROUND);
    egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
        ui.columns(2, |columns| {
            draw_input_panel(app, &mut columns[0]);
            draw_range_panel(&mut columns[1]);
        });
        ui.add_space(8.0);
        draw_buttons(app, ui, ctx);
        ui.add_space(8.0);
        ui.columns(2, |columns| {
            draw_curve_plot(app, &mut columns[0]);
            draw_attribution_plot(app, &mut columns[1]);
        });
    });
}

fn draw_input_panel(app: &mut PredictorApp, ui: &mut Ui) {
    ui.group(|ui| {
        ui.heading("Define Input Parameters");
        ui.add_space(4.0);
        egui::Grid::new("input_grid")
            .num_columns(3)
            .spacing([12.0, 10.0])
            .show(ui, |ui| {
                for kind in ParameterKind::ALL {
                    ui.label(kind.label());
                    let entry = egui::TextEdit::singleline(&mut app.entries[kind.index()])
                        .background_color(ENTRY_FILL)
                        .desired_width(120.0);
                    let response = ui.add(entry);
                    if response.lost_focus() {
                        app.validate_entry(kind);
                    }
                    if app.dialog.is_none() && app.refocus == Some(kind) {
                        response.request_focus();
                        app.refocus = None;
                    }
                    ui.label("mm");
                    ui.end_row();
                }
            });
    });
}

fn draw_range_panel(ui: &mut Ui) {
    ui.group(|ui| {
        ui.heading("Range of Application");
        ui.add_space(4.0);
        for kind in ParameterKind::ALL {
            let range = kind.range();
            ui.label(format!(
                "{} ≤ {} (mm) ≤ {}",
                range.start(),
                kind.symbol(),
                range.end()
            ));
        }
        ui.add_space(8.0);
        ui.small("Note: Dimensions of the column and beam are identical");
    });
}

fn draw_buttons(app: &mut PredictorApp, ui: &mut Ui, ctx: &egui::Context) {
    ui.horizontal(|ui| {
        let size = [110.0, 32.0];
        let predict = ui.add_enabled(app.can_predict(), egui::Button::new("Predict").min_size(size.into()));
        if predict.clicked() {
            app.predict();
        }
        if ui.add(egui::Button::new("Clear").min_size(size.into())).clicked() {
            app.clear();
        }
        if ui.add(egui::Button::new("Close").min_size(size.into())).clicked() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        ui.add_space(16.0);
        match &app.predictor {
            Ok(predictor) => {
                ui.weak(format!("Model: {}", predictor.name()));
            }
            Err(reason) => {
                ui.colored_label(LOWERS_COLOR, format!("Model unavailable: {reason}"));
            }
        }
    });
}

fn draw_curve_plot(app: &PredictorApp, ui: &mut Ui) {
    ui.label(RichText::new("Predicted moment-rotation curve").strong());
    Plot::new("moment_rotation_curve")
        .height(PLOT_HEIGHT)
        .x_axis_label("Rotation (rad)")
        .y_axis_label("Moment (kNm)")
        .include_x(0.0)
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if let Some(analysis) = &app.analysis {
                let points = PlotPoints::from(plot::curve_points(&analysis.curve));
                plot_ui.line(Line::new(points).color(RAISES_COLOR).width(2.0).name("Moment"));
            }
        });
}

fn draw_attribution_plot(app: &PredictorApp, ui: &mut Ui) {
    ui.label(RichText::new("Impact of geometric parameters").strong());
    Plot::new("attribution_bars")
        .height(PLOT_HEIGHT)
        .x_axis_label("SHAP value (Impact on prediction)")
        .include_x(0.0)
        .y_axis_formatter(|mark: GridMark, _range| plot::category_label(mark.value))
        .y_axis_min_width(150.0)
        .show_grid([true, false])
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if let Some(analysis) = &app.analysis {
                let bars = plot::attribution_bars(&analysis.attribution)
                    .into_iter()
                    .map(|bar| {
                        Bar::new(bar.position, bar.score)
                            .fill(bar.color)
                            .width(0.7)
                            .name(bar.label)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            }
        });
    ui.small("Note: The red color indicates that the parameter positively contributes to the prediction");
}

/// Shows the pending error, if any, until the user dismisses it.
pub fn draw_error_dialog(app: &mut PredictorApp, ctx: &egui::Context) {
    let Some(dialog) = &app.dialog else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new(dialog.title)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(&dialog.message);
            ui.add_space(6.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        app.dialog = None;
    }
}
