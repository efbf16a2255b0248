use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use sectorcast::material::{Lit, Material, MaterialKind, Texture, TextureLevel};
use sectorcast::math::{Vec2, Vec3, Vec4};
use sectorcast::present::{ScaleLut, blit_bilinear_stretch};
use sectorcast::world::{Light, PlaneKind, SectorBehavior, SectorId, ShadowMode, Surface};
use sectorcast::{Camera, RenderConfig, Renderer, World, WorldBuilder};

#[derive(Parser, Debug)]
#[command(version, about = "Sector raycaster demo")]
struct Args {
    /// TOML file with renderer settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Internal render width in pixels.
    #[arg(long)]
    width: Option<usize>,
    /// Internal render height in pixels.
    #[arg(long)]
    height: Option<usize>,
    /// Render every column on the main thread.
    #[arg(long)]
    single_thread: bool,
}

const DOOR_OPEN: f64 = 64.0;

struct Demo {
    world: World,
    camera: Camera,
    door: SectorId,
}

fn lit(mut m: Material) -> Material {
    m.lit = Some(Lit {
        ambient: Vec3::new(0.12, 0.12, 0.15),
        ..Lit::default()
    });
    m
}

fn sky_texture() -> Texture {
    let (w, h) = (64u32, 32u32);
    let mut data = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        let t = y as f64 / (h - 1) as f64;
        let r = (40.0 + 80.0 * t) as u32;
        let g = (70.0 + 90.0 * t) as u32;
        let b = (160.0 + 60.0 * t) as u32;
        for _ in 0..w {
            data.push((r << 24) | (g << 16) | (b << 8) | 0xFF);
        }
    }
    Texture::new(vec![TextureLevel::new(w, h, data)])
}

/// A hall with a lamp, a door into an open courtyard and a flooded pit.
fn demo_world() -> sectorcast::Result<Demo> {
    let mut b = WorldBuilder::new();
    let floor = b.add_material(lit(Material::checker(
        "floor",
        Vec4::opaque(0.55, 0.5, 0.45),
        Vec4::opaque(0.35, 0.32, 0.3),
        8.0,
    )));
    let ceiling = b.add_material(lit(Material::solid("ceiling", Vec4::opaque(0.6, 0.6, 0.65))));
    let wall = b.add_material(lit(Material::checker(
        "brick",
        Vec4::opaque(0.7, 0.35, 0.25),
        Vec4::opaque(0.6, 0.3, 0.2),
        4.0,
    )));
    let stone = b.add_material(lit(Material::solid("stone", Vec4::opaque(0.5, 0.5, 0.5))));
    let water = b.add_material(lit(Material::solid("water", Vec4::opaque(0.1, 0.3, 0.5))));
    let sky = b.add_material(Material {
        name: "sky".into(),
        kind: MaterialKind::Sky(sky_texture()),
        lit: None,
    });
    let glow = b.add_material(Material::solid("glow", Vec4::opaque(1.0, 0.95, 0.7)).unlit());

    let hall = b.add_sector(
        "hall",
        &[
            Vec2::new(0.0, 0.0),
            Vec2::new(128.0, 0.0),
            Vec2::new(128.0, 48.0),
            Vec2::new(128.0, 80.0),
            Vec2::new(128.0, 128.0),
            Vec2::new(80.0, 128.0),
            Vec2::new(48.0, 128.0),
            Vec2::new(0.0, 128.0),
        ],
        0.0,
        64.0,
    );
    b.paint_sector(hall, floor, ceiling, wall);

    let door = b.add_sector(
        "door",
        &[
            Vec2::new(128.0, 48.0),
            Vec2::new(144.0, 48.0),
            Vec2::new(144.0, 80.0),
            Vec2::new(128.0, 80.0),
        ],
        0.0,
        DOOR_OPEN,
    );
    b.paint_sector(door, stone, stone, stone);
    b.sector_mut(door).behavior = SectorBehavior::Door {
        open_top: DOOR_OPEN,
    };

    let court = b.add_sector(
        "court",
        &[
            Vec2::new(144.0, 0.0),
            Vec2::new(272.0, 0.0),
            Vec2::new(272.0, 128.0),
            Vec2::new(144.0, 128.0),
            Vec2::new(144.0, 80.0),
            Vec2::new(144.0, 48.0),
        ],
        -8.0,
        96.0,
    );
    b.paint_sector(court, floor, sky, stone);

    let pit = b.add_sector(
        "pit",
        &[
            Vec2::new(48.0, 128.0),
            Vec2::new(80.0, 128.0),
            Vec2::new(80.0, 176.0),
            Vec2::new(48.0, 176.0),
        ],
        -16.0,
        48.0,
    );
    b.paint_sector(pit, water, ceiling, stone);
    b.sector_mut(pit).behavior = SectorBehavior::Underwater {
        tint: Vec4::new(0.1, 0.3, 0.6, 0.4),
    };

    let pillar = b.add_internal_segment(Vec2::new(200.0, 40.0), Vec2::new(200.0, 88.0), -8.0, 40.0);
    let p = b.internal_segment_mut(pillar);
    p.surface = Surface::with_material(stone);
    p.two_sided = true;

    for (name, pos, strength) in [
        ("hall lamp", Vec3::new(64.0, 64.0, 52.0), 14.0),
        ("court lamp", Vec3::new(240.0, 64.0, 60.0), 20.0),
    ] {
        let lamp = b.add_body(name, pos, Vec2::new(8.0, 8.0));
        let body = b.body_mut(lamp);
        body.material = Some(glow);
        body.light = Some(Light {
            strength,
            attenuation: 1.0,
            ..Light::default()
        });
    }
    let barrel = b.add_body("barrel", Vec3::new(176.0, 96.0, 4.0), Vec2::new(12.0, 24.0));
    let body = b.body_mut(barrel);
    body.material = Some(stone);
    body.shadow = ShadowMode::Sphere;

    let world = b.build()?;
    let mut camera = Camera::new(Vec2::new(32.0, 64.0), 0.0, 32.0);
    camera.update_sector(&world);
    Ok(Demo {
        world,
        camera,
        door,
    })
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    renderer: Renderer,
    demo: Demo,
    door_open: bool,

    pixels: Vec<u32>,
    scale_lut: Option<ScaleLut>,
    cursor: Option<PhysicalPosition<f64>>,

    frame_counter: u32,
    last_fps_print: Instant,

    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
    move_speed: f64,
    turn_speed: f64,
}

impl App {
    fn new(renderer: Renderer, demo: Demo) -> Self {
        let pixels = vec![0; renderer.width() * renderer.height()];
        Self {
            window: None,
            surface: None,
            renderer,
            demo,
            door_open: true,
            pixels,
            scale_lut: None,
            cursor: None,
            frame_counter: 0,
            last_fps_print: Instant::now(),
            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            move_speed: 96.0,
            turn_speed: std::f64::consts::PI,
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;
        let dt = dt.as_secs_f64();

        let axis = |pos: KeyCode, neg: KeyCode| {
            self.keys_down.contains(&pos) as i32 as f64 - self.keys_down.contains(&neg) as i32 as f64
        };
        let mut fwd = axis(KeyCode::KeyW, KeyCode::KeyS);
        let mut strafe = axis(KeyCode::KeyD, KeyCode::KeyA);
        let turn = axis(KeyCode::KeyE, KeyCode::KeyQ);
        let look = axis(KeyCode::ArrowDown, KeyCode::ArrowUp);

        let cam = &mut self.demo.camera;
        cam.turn(turn * self.turn_speed * dt);
        cam.shear = (cam.shear + look * 240.0 * dt).clamp(-200.0, 200.0);

        if fwd != 0.0 || strafe != 0.0 {
            let inv = 1.0 / (fwd * fwd + strafe * strafe).sqrt();
            fwd *= inv;
            strafe *= inv;
            let step = (cam.forward() * fwd + cam.right() * strafe) * (self.move_speed * dt);
            cam.try_move(&self.demo.world, step);
        }
    }

    fn toggle_door(&mut self) {
        self.door_open = !self.door_open;
        let z = if self.door_open { DOOR_OPEN } else { 0.0 };
        match self.demo.world.set_plane_z(self.demo.door, PlaneKind::Top, z) {
            Ok(()) => log::info!("door {}", if self.door_open { "opened" } else { "closed" }),
            Err(e) => log::error!("failed to move door: {e}"),
        }
    }

    fn pick_at_cursor(&self, window: &Window) {
        let Some(pos) = self.cursor else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        let x = (pos.x / size.width as f64 * self.renderer.width() as f64) as usize;
        let y = (pos.y / size.height as f64 * self.renderer.height() as f64) as usize;
        let picked = self.renderer.pick(&self.demo.world, &self.demo.camera, x, y);
        if picked.is_empty() {
            log::info!("nothing under ({x}, {y})");
        }
        for r in picked {
            log::info!("picked {:?} {:?} at {:?}", r.object, r.surface, r.world);
        }
    }

    /// Keeps the internal height and follows the window's aspect ratio.
    fn fit_internal_size(&mut self, dst_w: usize, dst_h: usize) {
        if dst_w == 0 || dst_h == 0 {
            return;
        }
        let h = self.renderer.height();
        let mut w = ((h as f64 * dst_w as f64 / dst_h as f64).round() as usize).max(160);
        if w % 2 != 0 {
            w += 1;
        }
        if w == self.renderer.width() {
            return;
        }
        match self.renderer.resize(w, h) {
            Ok(()) => self.pixels = vec![0; w * h],
            Err(e) => log::error!("cannot resize renderer to {w}x{h}: {e}"),
        }
    }

    fn redraw(&mut self, id: WindowId) {
        self.tick();
        let (Some(window), Some(surface)) = (&self.window, &mut self.surface) else {
            return;
        };
        if window.id() != id {
            return;
        }
        let size = window.inner_size();
        let (Some(dw), Some(dh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        if let Err(e) = surface.resize(dw, dh) {
            log::error!("surface resize failed: {e}");
            return;
        }

        self.renderer.render(&self.demo.world, &self.demo.camera);
        self.renderer.write_pixels(&mut self.pixels);

        let (dw, dh) = (dw.get() as usize, dh.get() as usize);
        let (sw, sh) = (self.renderer.width(), self.renderer.height());
        let lut = match self.scale_lut.take() {
            Some(lut) if lut.fits(dw, dh, sw, sh) => lut,
            _ => ScaleLut::new(dw, dh, sw, sh),
        };
        let mut buf = match surface.buffer_mut() {
            Ok(buf) => buf,
            Err(e) => {
                log::error!("no surface buffer: {e}");
                return;
            }
        };
        blit_bilinear_stretch(&mut buf, &self.pixels, &lut);
        self.scale_lut = Some(lut);
        if let Err(e) = buf.present() {
            log::error!("present failed: {e}");
        }

        self.frame_counter += 1;
        let elapsed = self.last_fps_print.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            let notices = self.renderer.notices().drain();
            log::info!(
                "{:.1} fps, {} notices",
                self.frame_counter as f64 / elapsed,
                notices.len()
            );
            // The newest notice stays in the title until a quiet second.
            match notices.last() {
                Some(n) => window.set_title(&format!("sectorcast: {n}")),
                None => window.set_title("sectorcast"),
            }
            self.frame_counter = 0;
            self.last_fps_print = Instant::now();
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("sectorcast")
            .with_inner_size(LogicalSize::new(960.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(w) => Rc::new(w),
            Err(e) => {
                log::error!("cannot create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(s) => s,
            Err(e) => {
                log::error!("cannot create softbuffer surface: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.fit_internal_size(size.width as usize, size.height as usize);
        self.surface = Some(surface);
        self.last_tick = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    match code {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::Space if !repeat => self.toggle_door(),
                        _ => {}
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(window) = &self.window {
                    self.pick_at_cursor(window);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(id),
            WindowEvent::Resized(size) => {
                self.fit_internal_size(size.width as usize, size.height as usize)
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(w) = args.width {
        cfg.width = w;
    }
    if let Some(h) = args.height {
        cfg.height = h;
    }
    if args.single_thread {
        cfg.multithreaded = false;
    }
    let renderer = Renderer::new(cfg)?;
    let demo = demo_world()?;
    log::info!(
        "WASD move, Q/E turn, arrows look, space toggles the door, click to pick"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut app = App::new(renderer, demo);
    event_loop.run_app(&mut app)?;
    Ok(())
}
