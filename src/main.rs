// main.rs — 桌面外壳：窗口、拖拽输入、模式切换、图片加载

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod config;
mod i18n;
mod renderer;

use config::{ViewerConfig, SENSITIVITY_RANGE};
use pano_sphere::{mesh, Frame, RenderBackend, ViewMode, ViewModel};
use renderer::Renderer;

use anyhow::Context;
use image::GenericImageView;
use log::{error, info, warn};
use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Outcome of a background decode; the error is already human readable.
type LoadResult = Result<image::RgbaImage, String>;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Everything the egui overlay reads or edits in one frame.
struct UiState {
    lang: String,
    sensitivity: f32,
    slices: usize,
    pending_slices: usize,
    is_fullscreen: bool,
    is_loading: bool,
    load_error: Option<String>,
    show_fps: bool,
    fps: f32,
    // 本帧产生的请求，由事件循环处理
    requested_mode: Option<ViewMode>,
    requested_slices: Option<usize>,
    next_image: Option<PathBuf>,
    toggle_fullscreen: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::from_args();
    i18n::init(&config.lang);

    let sphere = mesh::generate(config.slices, config.radius).context("invalid sphere mesh")?;

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
    renderer.upload_mesh(&sphere)?;

    let mut view_model = ViewModel::new(config.mode);
    let mut ui = UiState {
        lang: config.lang.clone(),
        sensitivity: config.sensitivity,
        slices: config.slices,
        pending_slices: config.slices,
        is_fullscreen: false,
        is_loading: false,
        load_error: None,
        show_fps: false,
        fps: 0.0,
        requested_mode: None,
        requested_slices: None,
        next_image: None,
        toggle_fullscreen: false,
    };

    // 拖拽状态 (鼠标左键或单指触摸)
    let mut mouse_pressed = false;
    let mut last_pointer: Option<PhysicalPosition<f64>> = None;
    let mut active_touch: Option<u64> = None;

    let mut last_frame_time = Instant::now();
    let mut frame_count = 0u32;

    let (tx, rx): (Sender<LoadResult>, Receiver<LoadResult>) = channel();
    if let Some(path) = config.image.clone() {
        ui.is_loading = true;
        start_load_image(path, tx.clone());
    }

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(result) = rx.try_recv() {
            if let Some(rgba) = ui.finish_loading(result) {
                renderer.load_panorama(rgba);
            }
        }

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,

                    WindowEvent::Resized(new_size) => renderer.resize(new_size),

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::O) => {
                                    ui.next_image = pick_image_file();
                                }
                                Some(VirtualKeyCode::F11) => ui.toggle_fullscreen = true,
                                Some(VirtualKeyCode::Key1) => ui.requested_mode = Some(ViewMode::Sphere),
                                Some(VirtualKeyCode::Key2) => ui.requested_mode = Some(ViewMode::Pano),
                                Some(VirtualKeyCode::Key3) => ui.requested_mode = Some(ViewMode::Asteroid),
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            if !mouse_pressed {
                                last_pointer = None;
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_pressed {
                            if let Some(last) = last_pointer {
                                let dx = (position.x - last.x) as f32 * ui.sensitivity;
                                let dy = (position.y - last.y) as f32 * ui.sensitivity;
                                view_model.apply_drag(dx, dy);
                            }
                            last_pointer = Some(position);
                        }
                    }

                    WindowEvent::Touch(Touch { phase, location, id, .. }) => match phase {
                        TouchPhase::Started if active_touch.is_none() => {
                            active_touch = Some(id);
                            last_pointer = Some(location);
                        }
                        TouchPhase::Moved if active_touch == Some(id) => {
                            if let Some(last) = last_pointer {
                                let dx = (location.x - last.x) as f32 * ui.sensitivity;
                                let dy = (location.y - last.y) as f32 * ui.sensitivity;
                                view_model.apply_drag(dx, dy);
                            }
                            last_pointer = Some(location);
                        }
                        TouchPhase::Ended | TouchPhase::Cancelled if active_touch == Some(id) => {
                            active_touch = None;
                            last_pointer = None;
                        }
                        _ => {}
                    },

                    WindowEvent::DroppedFile(path) => ui.next_image = Some(path),

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let elapsed = last_frame_time.elapsed().as_secs_f32();
                if elapsed >= 1.0 {
                    ui.fps = frame_count as f32 / elapsed;
                    frame_count = 0;
                    last_frame_time = Instant::now();
                }

                match Frame::capture(&view_model, renderer.size.width, renderer.size.height) {
                    Ok(frame) => {
                        if let Err(e) = renderer.bind_frame(&frame) {
                            error!("failed to bind frame: {e:#}");
                        }
                    }
                    // 窗口最小化时高度为 0，跳过本帧
                    Err(_) => return,
                }

                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &view_model, &mut ui, &window);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => warn!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                apply_requests(&mut ui, &mut view_model, &mut renderer, &window, config.radius, &tx);
                window.request_redraw();
            }

            _ => {}
        }
    })
}

fn apply_requests(
    ui: &mut UiState,
    view_model: &mut ViewModel,
    renderer: &mut Renderer,
    window: &winit::window::Window,
    radius: f32,
    tx: &Sender<LoadResult>,
) {
    if let Some(mode) = ui.requested_mode.take() {
        info!("view mode -> {mode}");
        view_model.set_mode(mode);
    }

    if let Some(slices) = ui.requested_slices.take() {
        match mesh::generate(slices, radius) {
            Ok(sphere) => match renderer.upload_mesh(&sphere) {
                Ok(()) => ui.slices = slices,
                Err(e) => error!("mesh upload failed: {e:#}"),
            },
            Err(e) => warn!("re-tessellation rejected: {e}"),
        }
    }

    if let Some(path) = ui.next_image.take() {
        ui.is_loading = true;
        ui.load_error = None;
        start_load_image(path, tx.clone());
    }

    if std::mem::take(&mut ui.toggle_fullscreen) {
        ui.is_fullscreen = !ui.is_fullscreen;
        if ui.is_fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            window.set_fullscreen(None);
        }
    }
}

fn pick_image_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter(&i18n::tr("file.filter.images"), &IMAGE_EXTENSIONS)
        .pick_file()
}

impl UiState {
    /// Clear the loading flag for either outcome; hand back the image to upload.
    fn finish_loading(&mut self, result: LoadResult) -> Option<image::RgbaImage> {
        self.is_loading = false;
        match result {
            Ok(rgba) => {
                self.load_error = None;
                Some(rgba)
            }
            Err(e) => {
                error!("{e}");
                self.load_error = Some(e);
                None
            }
        }
    }
}

fn decode_panorama(path: &Path) -> LoadResult {
    let img = image::io::Reader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;

    let (w, h) = img.dimensions();
    info!("image decoded: {w}x{h}");
    if w != 2 * h {
        warn!("{w}x{h} is not 2:1, the panorama will look stretched");
    }
    Ok(img.to_rgba8())
}

fn start_load_image(path: PathBuf, tx: Sender<LoadResult>) {
    thread::spawn(move || {
        info!("loading image in background: {}", path.display());
        if tx.send(decode_panorama(&path)).is_err() {
            error!("viewer closed before the image arrived");
        }
    });
}

fn draw_ui(ctx: &egui::Context, view_model: &ViewModel, ui_state: &mut UiState, window: &winit::window::Window) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(i18n::tr("menu.file"), |ui| {
                if ui.button(i18n::tr("menu.open_image")).clicked() {
                    ui.close_menu();
                    ui_state.next_image = pick_image_file();
                }
                if ui.button(i18n::tr("menu.exit")).clicked() {
                    std::process::exit(0);
                }
            });

            ui.menu_button(i18n::tr("menu.view"), |ui| {
                if ui.button(i18n::tr("view.reset")).clicked() {
                    ui_state.requested_mode = Some(view_model.mode());
                    ui.close_menu();
                }

                let fullscreen_label = if ui_state.is_fullscreen {
                    i18n::tr("view.fullscreen.exit")
                } else {
                    i18n::tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    ui_state.toggle_fullscreen = true;
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button(i18n::tr("view.input_sensitivity"), |ui| {
                    ui.add(
                        egui::Slider::new(&mut ui_state.sensitivity, SENSITIVITY_RANGE)
                            .text(i18n::tr("view.multiplier")),
                    );
                    if ui.button(i18n::tr("view.reset_1_0")).clicked() {
                        ui_state.sensitivity = 1.0;
                    }
                });

                ui.menu_button(i18n::tr("view.mesh_detail"), |ui| {
                    ui.add(
                        egui::Slider::new(&mut ui_state.pending_slices, 4..=512)
                            .step_by(2.0)
                            .text(i18n::tr("view.slices")),
                    );
                    if ui.button(i18n::tr("view.apply")).clicked() {
                        // 经线分段必须为偶数
                        ui_state.requested_slices = Some(ui_state.pending_slices & !1);
                        ui.close_menu();
                    }
                });

                ui.separator();
                if ui.checkbox(&mut ui_state.show_fps, i18n::tr("view.show_fps")).clicked() {
                    ui.close_menu();
                }
            });

            ui.menu_button(i18n::tr("menu.language"), |ui| {
                for (code, name) in i18n::LANGUAGES {
                    if ui.radio_value(&mut ui_state.lang, code.to_string(), name).clicked() {
                        i18n::init(&ui_state.lang);
                        window.set_title(&i18n::tr("app.title"));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        // 模式切换 (分段控件)
        ui.horizontal(|ui| {
            for mode in ViewMode::ALL {
                if ui
                    .selectable_label(view_model.mode() == mode, i18n::mode_label(mode))
                    .clicked()
                {
                    ui_state.requested_mode = Some(mode);
                }
            }
        });

        ui.horizontal(|ui| {
            if ui_state.is_loading {
                ui.label(egui::RichText::new(i18n::tr("status.loading_image")).color(egui::Color32::YELLOW));
                ui.label("|");
            } else if let Some(e) = &ui_state.load_error {
                ui.label(egui::RichText::new(i18n::tr("status.load_failed")).color(egui::Color32::RED))
                    .on_hover_text(e);
                ui.label("|");
            }

            let rotation = view_model.rotation();
            ui.label(format!("{} {}", i18n::tr("status.mode_prefix"), i18n::mode_label(view_model.mode())));
            ui.label("|");
            ui.label(format!("FOV: {:.0}°", view_model.preset().fov_degrees));
            ui.label("|");
            ui.label(format!("X: {:.1}°", rotation.x_axis_rotate.to_degrees()));
            ui.label("|");
            ui.label(format!("Y: {:.1}°", rotation.y_axis_rotate.to_degrees()));
            ui.label("|");
            ui.label(format!("{} {}", i18n::tr("status.slices_prefix"), ui_state.slices));

            if ui_state.show_fps {
                ui.label("|");
                ui.label(egui::RichText::new(format!("FPS: {:.1}", ui_state.fps)).color(egui::Color32::GREEN));
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_ui() -> UiState {
        UiState {
            lang: "en".into(),
            sensitivity: 1.0,
            slices: 64,
            pending_slices: 64,
            is_fullscreen: false,
            is_loading: true,
            load_error: None,
            show_fps: false,
            fps: 0.0,
            requested_mode: None,
            requested_slices: None,
            next_image: None,
            toggle_fullscreen: false,
        }
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let missing = std::env::temp_dir().join("pano-sphere-missing.jpg");
        assert!(decode_panorama(&missing).is_err());

        let garbage = std::env::temp_dir().join(format!("pano-sphere-garbage-{}.png", std::process::id()));
        std::fs::write(&garbage, b"not an image").unwrap();
        let err = decode_panorama(&garbage).unwrap_err();
        assert!(err.contains("failed to decode"));
        std::fs::remove_file(&garbage).unwrap();
    }

    #[test]
    fn test_decode_success() {
        let path = std::env::temp_dir().join(format!("pano-sphere-ok-{}.png", std::process::id()));
        image::RgbaImage::new(8, 4).save(&path).unwrap();
        let rgba = decode_panorama(&path).unwrap();
        assert_eq!(rgba.dimensions(), (8, 4));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_finish_loading_clears_flag_on_both_outcomes() {
        let mut ui = idle_ui();
        assert!(ui.finish_loading(Err("failed to decode x.jpg".into())).is_none());
        assert!(!ui.is_loading);
        assert_eq!(ui.load_error.as_deref(), Some("failed to decode x.jpg"));

        ui.is_loading = true;
        assert!(ui.finish_loading(Ok(image::RgbaImage::new(2, 1))).is_some());
        assert!(!ui.is_loading);
        assert!(ui.load_error.is_none());
    }

    #[test]
    fn test_worker_sends_failure() {
        let (tx, rx) = channel();
        start_load_image(PathBuf::from("/nonexistent/pano-sphere.jpg"), tx);
        let result = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert!(result.is_err());
    }
}
