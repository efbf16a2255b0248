use sectorcast::material::{Lit, Material};
use sectorcast::math::{Vec2, Vec3, Vec4};
use sectorcast::world::{Light, PlaneKind, SectorBehavior, SectorId, Surface};
use sectorcast::{Camera, RenderConfig, Renderer, Selectable, SurfaceKind, World, WorldBuilder};

const RED: Vec4 = Vec4::opaque(1.0, 0.0, 0.0);
const GREEN: Vec4 = Vec4::opaque(0.0, 1.0, 0.0);
const BLUE: Vec4 = Vec4::opaque(0.0, 0.0, 1.0);
const YELLOW: Vec4 = Vec4::opaque(1.0, 1.0, 0.0);
const MAGENTA: Vec4 = Vec4::opaque(1.0, 0.0, 1.0);

// 64x48 at 90 degrees puts the projection plane 32 pixels out and the
// horizon on row 24; column 32 looks straight ahead.
fn config() -> RenderConfig {
    RenderConfig {
        width: 64,
        height: 48,
        render_blocks: 4,
        multithreaded: false,
        ..RenderConfig::default()
    }
}

fn rect(b: &mut WorldBuilder, name: &str, x0: f64, x1: f64, floor: f64, ceil: f64) -> SectorId {
    b.add_sector(
        name,
        &[
            Vec2::new(x0, -50.0),
            Vec2::new(x1, -50.0),
            Vec2::new(x1, 50.0),
            Vec2::new(x0, 50.0),
        ],
        floor,
        ceil,
    )
}

struct Scene {
    builder: WorldBuilder,
    a: SectorId,
}

/// Room `a` spans x 0..100 with red walls, green floor and blue ceiling.
fn room() -> Scene {
    let mut builder = WorldBuilder::new();
    let wall = builder.add_material(Material::solid("red", RED).unlit());
    let floor = builder.add_material(Material::solid("green", GREEN).unlit());
    let ceil = builder.add_material(Material::solid("blue", BLUE).unlit());
    let a = rect(&mut builder, "a", 0.0, 100.0, 0.0, 64.0);
    builder.paint_sector(a, floor, ceil, wall);
    Scene { builder, a }
}

/// Adds sector `b` (x 100..200, floor 8, ceiling 56) behind `a`'s east wall
/// with yellow walls and a magenta far wall.
fn with_neighbor(scene: &mut Scene) -> SectorId {
    neighbor_at(scene, 100.0)
}

/// Same sector as `with_neighbor`, starting at `x0`.
fn neighbor_at(scene: &mut Scene, x0: f64) -> SectorId {
    let b = &mut scene.builder;
    let yellow = b.add_material(Material::solid("yellow", YELLOW).unlit());
    let magenta = b.add_material(Material::solid("magenta", MAGENTA).unlit());
    let s = rect(b, "b", x0, x0 + 100.0, 8.0, 56.0);
    b.paint_sector(s, yellow, yellow, yellow);
    let east = b.segment_of(s, 1);
    b.segment_mut(east).mid = Surface::with_material(magenta);
    s
}

fn camera(world: &World, yaw: f64) -> Camera {
    let mut cam = Camera::new(Vec2::new(10.0, 0.0), yaw, 32.0);
    assert!(cam.update_sector(world));
    cam
}

#[test]
fn rectangle_room_draws_wall_floor_and_ceiling() {
    let scene = room();
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    r.render(&world, &camera(&world, 0.0));

    // east wall at distance 90 covers rows 13..36 of the center column
    assert_eq!(r.pixel(32, 24), RED);
    assert!((r.depth(32, 24) - 90.0).abs() < 1e-9);
    assert_eq!(r.pixel(32, 13), RED);
    assert_eq!(r.pixel(32, 35), RED);
    assert_eq!(r.pixel(32, 0), BLUE);
    assert_eq!(r.pixel(32, 12), BLUE);
    assert_eq!(r.pixel(32, 47), GREEN);
    assert!(r.depth(32, 47) < 90.0);
    assert!(r.notices().is_empty());

    let mut out = vec![0u32; 64 * 48];
    r.write_pixels(&mut out);
    assert_eq!(out[24 * 64 + 32], 0x00FF_0000);
    assert_eq!(out[0], 0x0000_00FF);
}

#[test]
fn parallel_and_sequential_frames_match() {
    let mut scene = room();
    with_neighbor(&mut scene);
    let world = scene.builder.build().unwrap();
    let cam = camera(&world, 0.3);

    let mut seq = Renderer::new(config()).unwrap();
    let mut par = Renderer::new(RenderConfig {
        multithreaded: true,
        render_blocks: 7,
        ..config()
    })
    .unwrap();
    seq.render(&world, &cam);
    par.render(&world, &cam);
    for x in 0..64 {
        for y in 0..48 {
            assert_eq!(seq.pixel(x, y), par.pixel(x, y), "pixel {x},{y}");
            assert_eq!(seq.depth(x, y), par.depth(x, y), "depth {x},{y}");
        }
    }
}

#[test]
fn portal_recurses_once_into_the_neighbor() {
    let mut scene = room();
    let b = with_neighbor(&mut scene);
    let a = scene.a;
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    let cam = camera(&world, 0.0);
    r.render(&world, &cam);

    // far wall of b at 190 seen through the portal
    assert_eq!(r.pixel(32, 24), MAGENTA);
    assert!((r.depth(32, 24) - 190.0).abs() < 1e-9);
    // b's lower ceiling leaves a band above the portal, drawn at the portal
    assert_eq!(r.pixel(32, 14), YELLOW);
    assert!((r.depth(32, 14) - 90.0).abs() < 1e-9);
    assert_eq!(r.pixel(32, 34), YELLOW);
    assert_eq!(world.sector(b).last_seen_frame(), r.frame());
    assert!(r.notices().is_empty());

    let far_wall = world.sector(b).segments[1];
    let west = world.sector(b).segments[3];
    let picked = r.pick(&world, &cam, 32, 24);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].object, Selectable::Segment(far_wall));
    assert_eq!(picked[0].surface, SurfaceKind::Mid);
    assert!((picked[0].world.x - 200.0).abs() < 1e-9);
    assert!((picked[0].world.z - 32.0).abs() < 1e-9);

    let hi = r.pick(&world, &cam, 32, 14);
    assert_eq!(hi.len(), 1);
    assert_eq!(hi[0].object, Selectable::Segment(west));
    assert_eq!(hi[0].surface, SurfaceKind::Hi);

    let floor = r.pick(&world, &cam, 32, 47);
    assert_eq!(floor[0].object, Selectable::Sector(a));
    assert_eq!(floor[0].surface, SurfaceKind::Floor);
    assert_eq!(floor[0].world.z, 0.0);
}

#[test]
fn teleporting_portal_continues_in_the_linked_sector() {
    let mut scene = room();
    let far = neighbor_at(&mut scene, 300.0);
    let (east, west) = (
        scene.builder.segment_of(scene.a, 1),
        scene.builder.segment_of(far, 3),
    );
    scene.builder.link_portal(east, west, true);
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    let cam = camera(&world, 0.0);
    r.render(&world, &cam);

    // the ray comes out at (210, 0), 190 short of the far wall
    assert_eq!(r.pixel(32, 24), MAGENTA);
    assert!((r.depth(32, 24) - 190.0).abs() < 1e-9);
    assert_eq!(world.sector(far).last_seen_frame(), r.frame());

    // the eye is lifted by the floor step, so the neighbor's opening spans
    // z 0..48 at the portal: a taller upper band and no lower band
    assert_eq!(r.pixel(32, 18), YELLOW);
    assert!((r.depth(32, 18) - 90.0).abs() < 1e-9);
    assert_eq!(r.pixel(32, 34), YELLOW);
    assert!(r.depth(32, 34) > 90.0);
    assert!(r.notices().is_empty());

    let hi = r.pick(&world, &cam, 32, 18);
    assert_eq!(hi.len(), 1);
    assert_eq!(hi[0].object, Selectable::Segment(west));
    assert_eq!(hi[0].surface, SurfaceKind::Hi);
}

#[test]
fn ignored_slope_keeps_wall_texture_level() {
    let build = |ignore: bool| {
        let mut b = WorldBuilder::new();
        let plain = b.add_material(Material::solid("green", GREEN).unlit());
        let check = b.add_material(Material::checker("check", RED, BLUE, 2.0).unlit());
        let a = rect(&mut b, "a", 0.0, 100.0, 0.0, 64.0);
        b.paint_sector(a, plain, plain, plain);
        // floor climbs to z 16 at the east wall
        b.sector_mut(a).bottom.normal = Vec3::new(-0.16, 0.0, 1.0).normalized();
        let east = b.segment_of(a, 1);
        b.segment_mut(east).mid = Surface::with_material(check);
        b.segment_mut(east).wall_uv_ignore_slope = ignore;
        b.build().unwrap()
    };
    let render = |world: &World| {
        let mut cam = Camera::new(Vec2::new(10.0, 10.0), 0.0, 32.0);
        assert!(cam.update_sector(world));
        let mut r = Renderer::new(config()).unwrap();
        r.render(world, &cam);
        r
    };

    // the wall spans rows 13..30 either way; only its texture V changes
    let sloped = render(&build(false));
    assert_ne!(sloped.pixel(32, 20), sloped.pixel(32, 22));

    let level = render(&build(true));
    assert_eq!(level.pixel(32, 20), level.pixel(32, 22));
    assert_ne!(level.pixel(32, 22), level.pixel(32, 26));
    assert_eq!(level.pixel(32, 29), sloped.pixel(32, 29));
    assert!((level.depth(32, 29) - 90.0).abs() < 1e-9);
}

#[test]
fn portal_depth_limit_is_reported() {
    let mut scene = room();
    with_neighbor(&mut scene);
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(RenderConfig {
        max_portal_depth: 0,
        ..config()
    })
    .unwrap();
    r.render(&world, &camera(&world, 0.0));
    let notices = r.notices().drain();
    assert_eq!(notices, vec!["Maximum portal depth reached at sector a".to_string()]);
    // nothing drawn behind the portal
    assert!(r.depth(32, 24) > 100.0);
}

#[test]
fn camera_outside_the_world_is_a_notice() {
    let scene = room();
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    r.render(&world, &Camera::new(Vec2::new(-50.0, 0.0), 0.0, 32.0));
    assert_eq!(r.notices().len(), 1);
    assert_eq!(r.pixel(32, 24), Vec4::TRANSPARENT);
}

#[test]
fn bodies_and_internal_segments_draw_in_front() {
    let mut scene = room();
    let b = &mut scene.builder;
    let white = b.add_material(Material::solid("white", Vec4::opaque(1.0, 1.0, 1.0)).unlit());
    let yellow = b.add_material(Material::solid("yellow", YELLOW).unlit());
    let body = b.add_body("post", Vec3::new(40.0, 0.0, 32.0), Vec2::new(16.0, 16.0));
    b.body_mut(body).material = Some(white);
    let screen = b.add_internal_segment(Vec2::new(60.0, -10.0), Vec2::new(60.0, 10.0), 0.0, 48.0);
    b.internal_segment_mut(screen).surface = Surface::with_material(yellow);
    let a = scene.a;
    let world = scene.builder.build().unwrap();
    assert!(world.sector(a).internal_segments.contains(&screen));

    let mut r = Renderer::new(config()).unwrap();
    let cam = camera(&world, 0.0);
    r.render(&world, &cam);

    // body at 30 spans rows 16..33, the screen at 50 rows 14..45
    assert_eq!(r.pixel(32, 24), Vec4::opaque(1.0, 1.0, 1.0));
    assert!((r.depth(32, 24) - 30.0).abs() < 1e-9);
    assert_eq!(r.pixel(32, 14), YELLOW);
    assert!((r.depth(32, 14) - 50.0).abs() < 1e-9);
    assert_eq!(r.pixel(32, 13), RED);

    let picked = r.pick(&world, &cam, 32, 24);
    let objects: Vec<_> = picked.iter().map(|p| p.object).collect();
    assert_eq!(
        objects,
        vec![
            Selectable::Body(body),
            Selectable::InternalSegment(screen),
            Selectable::Segment(world.sector(a).segments[1]),
        ]
    );
    assert_eq!(picked[1].surface, SurfaceKind::InternalSegment);
}

fn lit_room(strength: Option<f64>) -> World {
    let mut b = WorldBuilder::new();
    let white = b.add_material(Material {
        lit: Some(Lit::default()),
        ..Material::solid("white", Vec4::opaque(1.0, 1.0, 1.0))
    });
    let a = rect(&mut b, "a", 0.0, 100.0, 0.0, 64.0);
    b.paint_sector(a, white, white, white);
    if let Some(strength) = strength {
        let lamp = b.add_body("lamp", Vec3::new(10.0, 0.0, 32.0), Vec2::new(8.0, 8.0));
        b.body_mut(lamp).light = Some(Light {
            strength,
            attenuation: 1.0,
            ..Light::default()
        });
    }
    b.build().unwrap()
}

#[test]
fn wall_facing_a_light_gets_its_attenuated_diffuse() {
    // 90 units out the falloff divisor is 90 * 2 / 8 + 1 = 23.5
    let world = lit_room(Some(23.5));
    let mut r = Renderer::new(config()).unwrap();
    r.render(&world, &camera(&world, 0.0));
    let c = r.pixel(32, 24);
    assert!(c.r > 0.9 && c.r <= 1.0, "{c:?}");
    assert_eq!(c.r, c.g);
    assert!(!world.sector(SectorId(0)).lightmap.is_empty());

    let dark = lit_room(None);
    let mut r = Renderer::new(config()).unwrap();
    r.render(&dark, &camera(&dark, 0.0));
    assert_eq!(r.pixel(32, 24).rgb(), Vec3::ZERO);
}

#[test]
fn moving_a_door_drops_cached_light() {
    let mut b = WorldBuilder::new();
    let white = b.add_material(Material::solid("white", Vec4::opaque(1.0, 1.0, 1.0)));
    let a = rect(&mut b, "a", 0.0, 100.0, 0.0, 64.0);
    let door = rect(&mut b, "door", 100.0, 200.0, 8.0, 56.0);
    b.paint_sector(a, white, white, white);
    b.paint_sector(door, white, white, white);
    b.sector_mut(door).behavior = SectorBehavior::Door { open_top: 56.0 };
    let lamp = b.add_body("lamp", Vec3::new(50.0, 0.0, 32.0), Vec2::new(8.0, 8.0));
    b.body_mut(lamp).light = Some(Light {
        strength: 20.0,
        ..Light::default()
    });
    let mut world = b.build().unwrap();

    let mut r = Renderer::new(config()).unwrap();
    let cam = camera(&world, 0.0);
    r.render(&world, &cam);
    assert!(!world.sector(a).lightmap.is_empty());
    assert!(!world.sector(door).lightmap.is_empty());

    world.set_plane_z(door, PlaneKind::Top, 8.0).unwrap();
    assert!(world.sector(a).lightmap.is_empty());
    assert!(world.sector(door).lightmap.is_empty());
    // the closed door stays in the PVS
    assert!(world.sector(a).pvs.contains(&door));

    // closed: the upper band fills the whole opening
    r.render(&world, &cam);
    let west = world.sector(door).segments[3];
    let picked = r.pick(&world, &cam, 32, 24);
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].object, Selectable::Segment(west));
    assert_eq!(picked[0].surface, SurfaceKind::Hi);
}

#[test]
fn unseen_sectors_lose_their_lightmaps() {
    let mut b = WorldBuilder::new();
    let white = b.add_material(Material::solid("white", Vec4::opaque(1.0, 1.0, 1.0)));
    let a = rect(&mut b, "a", 0.0, 100.0, 0.0, 64.0);
    let far = rect(&mut b, "far", 100.0, 200.0, 0.0, 64.0);
    b.paint_sector(a, white, white, white);
    b.paint_sector(far, white, white, white);
    let lamp = b.add_body("lamp", Vec3::new(150.0, 0.0, 32.0), Vec2::new(8.0, 8.0));
    b.body_mut(lamp).light = Some(Light {
        strength: 20.0,
        ..Light::default()
    });
    let world = b.build().unwrap();

    let mut r = Renderer::new(RenderConfig {
        lightmap_evict_frames: 2,
        ..config()
    })
    .unwrap();
    r.render(&world, &camera(&world, 0.0));
    assert_eq!(world.sector(far).last_seen_frame(), 1);
    assert!(!world.sector(far).lightmap.is_empty());

    // turned around, only `a` is visible
    let back = camera(&world, std::f64::consts::PI);
    r.render(&world, &back);
    assert!(!world.sector(far).lightmap.is_empty());
    r.render(&world, &back);
    assert!(world.sector(far).lightmap.is_empty());
    assert_eq!(world.sector(far).last_seen_frame(), 0);
    assert_eq!(world.sector(a).last_seen_frame(), 3);
}

#[test]
fn a_second_renderer_can_share_the_world() {
    let mut b = WorldBuilder::new();
    let white = b.add_material(Material::solid("white", Vec4::opaque(1.0, 1.0, 1.0)));
    let a = rect(&mut b, "a", 0.0, 100.0, 0.0, 64.0);
    let far = rect(&mut b, "far", 100.0, 200.0, 0.0, 64.0);
    b.paint_sector(a, white, white, white);
    b.paint_sector(far, white, white, white);
    let lamp = b.add_body("lamp", Vec3::new(150.0, 0.0, 32.0), Vec2::new(8.0, 8.0));
    b.body_mut(lamp).light = Some(Light {
        strength: 20.0,
        ..Light::default()
    });
    let world = b.build().unwrap();
    let cam = camera(&world, 0.0);

    let mut first = Renderer::new(config()).unwrap();
    for _ in 0..3 {
        first.render(&world, &cam);
    }
    assert_eq!(world.sector(far).last_seen_frame(), 3);

    // a fresh renderer counts from frame 1, behind what the world has seen
    let mut second = Renderer::new(RenderConfig {
        lightmap_evict_frames: 2,
        ..config()
    })
    .unwrap();
    second.render(&world, &camera(&world, std::f64::consts::PI));
    assert_eq!(second.frame(), 1);
    assert_eq!(world.sector(far).last_seen_frame(), 3);
    assert!(!world.sector(far).lightmap.is_empty());
}

#[test]
fn underwater_sector_tints_the_frame() {
    let mut scene = room();
    let tint = Vec4::new(0.0, 0.2, 0.8, 0.5);
    scene.builder.sector_mut(scene.a).behavior = SectorBehavior::Underwater { tint };
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    r.render(&world, &camera(&world, 0.0));
    assert_eq!(r.tint(), Vec4::new(0.0, 0.1, 0.4, 0.5));

    let mut out = vec![0u32; 64 * 48];
    r.write_pixels(&mut out);
    // red wall: 0.5 red, 0.1 green, 0.4 blue
    assert_eq!(out[24 * 64 + 32], 0x0080_1A66);
}

#[test]
fn resize_rebuilds_buffers() {
    let scene = room();
    let world = scene.builder.build().unwrap();
    let mut r = Renderer::new(config()).unwrap();
    r.resize(32, 24).unwrap();
    assert!(r.resize(0, 24).is_err());
    assert_eq!((r.width(), r.height()), (32, 24));
    r.render(&world, &camera(&world, 0.0));
    assert_eq!(r.pixel(16, 12), RED);
    assert!(r.pick(&world, &camera(&world, 0.0), 64, 0).is_empty());
}
