use crate::{
    Attachment, BlendMode, Bone, ClippingAttachment, ColorPacking, DarkTint, Draw, DrawList, Error,
    MeshAttachment, MeshVertices, NEUTRAL_DARK, PackedVertex, RegionAttachment, RenderConfig,
    Skeleton, SkeletonRenderer, SkipReason, Slot, TexturePage, TextureRegion, UvSpace,
    build_draw_list,
};
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-5,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn page(name: &str, pma: bool) -> Arc<TexturePage> {
    Arc::new(TexturePage::new(name, 64, 32, pma))
}

/// 2x2 quad centered at (1, 1) in bone space.
fn quad(name: &str, page: &Arc<TexturePage>) -> Attachment {
    Attachment::Region(
        RegionAttachment::new(name, 2.0, 2.0)
            .with_transform(1.0, 1.0, 0.0, 1.0, 1.0)
            .with_texture(TextureRegion::whole_page(Arc::clone(page))),
    )
}

fn clip(points: &[[f32; 2]], end_slot: Option<usize>) -> Attachment {
    Attachment::Clipping(
        ClippingAttachment::new("clip", MeshVertices::Unweighted(points.to_vec()), end_slot)
            .unwrap(),
    )
}

/// Covers the left half of [`quad`], with margins on the other three sides.
fn left_half_clip(end_slot: Option<usize>) -> Attachment {
    clip(&[[-1.0, -1.0], [1.0, -1.0], [1.0, 3.0], [-1.0, 3.0]], end_slot)
}

fn skeleton(slots: Vec<Slot>) -> Skeleton {
    Skeleton::new(vec![Bone::IDENTITY], slots)
}

fn draw_x_range(list: &DrawList, draw: usize) -> (f32, f32) {
    let draw = &list.draws[draw];
    list.indices[draw.first_index..draw.first_index + draw.index_count]
        .iter()
        .map(|&i| list.vertices[i as usize].position[0])
        .fold((f32::MAX, f32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)))
}

fn covered_area(list: &DrawList) -> f32 {
    list.indices
        .chunks_exact(3)
        .map(|t| {
            let [a, b, c] = [t[0], t[1], t[2]].map(|i| list.vertices[i as usize].position);
            ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs() * 0.5
        })
        .sum()
}

#[test]
fn region_attachment_emits_one_quad() {
    let page = page("head.png", false);
    let region = RegionAttachment::new("head", 2.0, 2.0)
        .with_transform(1.0, 2.0, 0.0, 1.0, 1.0)
        .with_texture(TextureRegion::whole_page(Arc::clone(&page)));
    let skeleton = skeleton(vec![
        Slot::new("slot0", 0).with_attachment(Attachment::Region(region)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert_eq!(draw_list.draws.len(), 1);
    assert_eq!(draw_list.vertices.len(), 4);
    assert_eq!(draw_list.indices, vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(draw_list.draws[0].texture.name, "head.png");
    assert_eq!(draw_list.draws[0].blend, BlendMode::Normal);
    assert!(!draw_list.draws[0].premultiplied_alpha);

    // BR, BL, UL, UR.
    let expected = [[2.0, 1.0], [0.0, 1.0], [0.0, 3.0], [2.0, 3.0]];
    for (vertex, [x, y]) in draw_list.vertices.iter().zip(expected) {
        assert_approx(vertex.position[0], x);
        assert_approx(vertex.position[1], y);
    }
    assert_eq!(draw_list.vertices[0].uv, [1.0, 1.0]);
    assert_eq!(draw_list.vertices[2].uv, [0.0, 0.0]);
}

#[test]
fn mesh_attachment_emits_its_triangles() {
    let page = page("mesh.png", false);
    let mesh = MeshAttachment::new(
        "mesh",
        MeshVertices::Unweighted(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]),
        vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        vec![0, 1, 2, 2, 3, 0],
    )
    .unwrap()
    .with_texture(TextureRegion::whole_page(Arc::clone(&page)));
    let mut skeleton = skeleton(vec![
        Slot::new("slot0", 0).with_attachment(Attachment::Mesh(mesh)),
    ]);
    skeleton.bones[0] = Bone::from_transform(10.0, 0.0, 0.0, 1.0, 1.0);

    let draw_list = build_draw_list(&skeleton);
    assert_eq!(draw_list.vertices.len(), 4);
    assert_eq!(draw_list.indices.len(), 6);
    assert_approx(draw_list.vertices[2].position[0], 14.0);
    assert_approx(draw_list.vertices[2].position[1], 4.0);
    assert_eq!(draw_list.vertices[3].uv, [0.0, 0.0]);
}

#[test]
fn half_transparent_slot_on_straight_alpha_page() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("slot0", 0)
            .with_color([1.0, 1.0, 1.0, 0.5])
            .with_attachment(quad("a", &page)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert!(!draw_list.draws[0].premultiplied_alpha);
    for vertex in &draw_list.vertices {
        assert_eq!(vertex.color, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(vertex.dark_color, NEUTRAL_DARK);
    }
}

#[test]
fn half_transparent_slot_on_premultiplied_page() {
    let page = page("a.png", true);
    let skeleton = skeleton(vec![
        Slot::new("slot0", 0)
            .with_color([1.0, 1.0, 1.0, 0.5])
            .with_attachment(quad("a", &page)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert!(draw_list.draws[0].premultiplied_alpha);
    for vertex in &draw_list.vertices {
        assert_eq!(vertex.color, [0.5, 0.5, 0.5, 0.5]);
    }
}

#[test]
fn config_can_force_premultiplied_alpha() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![Slot::new("slot0", 0).with_attachment(quad("a", &page))]);
    let mut renderer = SkeletonRenderer::new(RenderConfig {
        premultiplied_alpha: Some(true),
        ..RenderConfig::default()
    });

    let draw_list = renderer.render(&skeleton).unwrap();
    assert!(draw_list.draws[0].premultiplied_alpha);
}

#[test]
fn quad_half_covered_by_clip_keeps_covered_half() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("clip", 0).with_attachment(left_half_clip(None)),
        Slot::new("quad", 0).with_attachment(quad("a", &page)),
    ]);

    let mut renderer = SkeletonRenderer::default();
    let draw_list = renderer.render(&skeleton).unwrap();
    assert!(!draw_list.indices.is_empty());
    for vertex in &draw_list.vertices {
        assert!((-1.0e-5..=1.0 + 1.0e-5).contains(&vertex.position[0]));
        // u runs 0 -> 1 across the quad, so the kept half samples u in [0, 0.5].
        assert_approx(vertex.uv[0], vertex.position[0] * 0.5);
    }
    assert_approx(covered_area(draw_list), 2.0);

    assert_eq!(renderer.stats().clipped, 1);
    // No end slot: the clip is closed by the end of the pass.
    assert_eq!(renderer.stats().unclosed_clip, Some(0));
}

#[test]
fn clip_range_stops_at_end_slot() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("clip", 0).with_attachment(left_half_clip(Some(3))),
        Slot::new("b", 0).with_attachment(quad("b", &page)),
        Slot::new("c", 0).with_attachment(quad("c", &page)),
        Slot::new("end", 0),
        Slot::new("d", 0).with_attachment(quad("d", &page)),
    ]);
    let mut renderer = SkeletonRenderer::new(RenderConfig {
        batch_draws: false,
        ..RenderConfig::default()
    });

    let draw_list = renderer.render(&skeleton).unwrap();
    assert_eq!(draw_list.draws.len(), 3);
    for draw in 0..2 {
        let (lo, hi) = draw_x_range(draw_list, draw);
        assert_approx(lo, 0.0);
        assert_approx(hi, 1.0);
    }
    let (lo, hi) = draw_x_range(draw_list, 2);
    assert_approx(lo, 0.0);
    assert_approx(hi, 2.0);
    assert_eq!(draw_list.draws[2].index_count, 6);

    assert_eq!(renderer.stats().clipped, 2);
    assert_eq!(renderer.stats().emitted, 3);
    assert_eq!(renderer.stats().unclosed_clip, None);
}

#[test]
fn inactive_end_slot_still_ends_clip() {
    let page = page("a.png", false);
    let mut skeleton = Skeleton::new(
        vec![Bone::IDENTITY, Bone { active: false, ..Bone::IDENTITY }],
        vec![
            Slot::new("clip", 0).with_attachment(left_half_clip(Some(2))),
            Slot::new("b", 0).with_attachment(quad("b", &page)),
            Slot::new("hidden", 1).with_attachment(quad("hidden", &page)),
            Slot::new("d", 0).with_attachment(quad("d", &page)),
        ],
    );
    skeleton.draw_order = vec![0, 1, 2, 3];
    let mut renderer = SkeletonRenderer::new(RenderConfig {
        batch_draws: false,
        ..RenderConfig::default()
    });

    let draw_list = renderer.render(&skeleton).unwrap();
    assert_eq!(draw_list.draws.len(), 2);
    assert_approx(draw_x_range(draw_list, 0).1, 1.0);
    assert_approx(draw_x_range(draw_list, 1).1, 2.0);
    assert_eq!(renderer.stats().emitted, 2);
}

#[test]
fn unclosed_clip_does_not_leak_into_next_frame() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("quad", 0).with_attachment(quad("a", &page)),
        Slot::new("clip", 0).with_attachment(left_half_clip(Some(7))),
    ]);

    let mut renderer = SkeletonRenderer::default();
    for _ in 0..2 {
        let draw_list = renderer.render(&skeleton).unwrap();
        assert_eq!(draw_list.vertices.len(), 4);
        assert_eq!(renderer.stats().clipped, 0);
        assert_eq!(renderer.stats().unclosed_clip, Some(1));
    }
}

#[test]
fn fully_clipped_slot_is_skipped() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("clip", 0)
            .with_attachment(clip(&[[10.0, 10.0], [12.0, 10.0], [12.0, 12.0]], None)),
        Slot::new("quad", 0).with_attachment(quad("a", &page)),
    ]);

    let mut renderer = SkeletonRenderer::default();
    let draw_list = renderer.render(&skeleton).unwrap();
    assert!(draw_list.draws.is_empty());
    assert!(draw_list.vertices.is_empty());
    assert_eq!(renderer.stats().skipped_clipped_away, 1);
    assert_eq!(
        renderer.cache().slot(1).and_then(|slot| slot.skip),
        Some(SkipReason::ClippedAway)
    );
}

#[test]
fn unchanged_mesh_is_not_rebuilt_between_frames() {
    let page = page("mesh.png", false);
    let mesh = MeshAttachment::new(
        "mesh",
        MeshVertices::Unweighted(vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]]),
        vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        vec![0, 1, 2],
    )
    .unwrap()
    .with_texture(TextureRegion::whole_page(Arc::clone(&page)));
    let mut skeleton = skeleton(vec![
        Slot::new("slot0", 0).with_attachment(Attachment::Mesh(mesh)),
    ]);

    let mut renderer = SkeletonRenderer::default();
    renderer.render(&skeleton).unwrap();
    assert!(renderer.stats().attachments_changed);
    assert_eq!(renderer.cache().rebuild_count(), 1);

    // Bones move, attachment stays.
    skeleton.bones[0].world_x = 5.0;
    let draw_list = renderer.render(&skeleton).unwrap();
    assert_approx(draw_list.vertices[1].position[0], 9.0);
    assert!(!renderer.stats().attachments_changed);
    assert_eq!(renderer.cache().rebuild_count(), 1);
    let vertices = &renderer.cache().slot(0).unwrap().vertices;
    assert_eq!(vertices.grow_count(), 1);

    let swapped = skeleton.slots[0].attachment.as_deref().cloned().unwrap();
    skeleton.slots[0].attachment = Some(Arc::new(swapped));
    renderer.render(&skeleton).unwrap();
    assert!(renderer.stats().attachments_changed);
    assert_eq!(renderer.cache().rebuild_count(), 2);
}

#[test]
fn missing_texture_skips_slot_without_aborting() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("bare", 0)
            .with_attachment(Attachment::Region(RegionAttachment::new("bare", 2.0, 2.0))),
        Slot::new("quad", 0).with_attachment(quad("a", &page)),
    ]);

    let mut renderer = SkeletonRenderer::default();
    let draw_list = renderer.render(&skeleton).unwrap();
    assert_eq!(draw_list.draws.len(), 1);
    assert_eq!(draw_list.vertices.len(), 4);
    assert_eq!(renderer.stats().skipped_missing_texture, 1);
    assert_eq!(
        renderer.cache().slot(0).and_then(|slot| slot.skip),
        Some(SkipReason::MissingTexture)
    );
}

#[test]
fn transparent_slots_are_skipped() {
    let page = page("a.png", false);
    let hidden = RegionAttachment::new("hidden", 2.0, 2.0)
        .with_texture(TextureRegion::whole_page(Arc::clone(&page)))
        .with_color([1.0, 1.0, 1.0, 0.0]);
    let skeleton = skeleton(vec![
        Slot::new("hidden", 0).with_attachment(Attachment::Region(hidden)),
        Slot::new("faded", 0)
            .with_color([1.0, 1.0, 1.0, 0.0])
            .with_attachment(quad("a", &page)),
    ]);

    let mut renderer = SkeletonRenderer::default();
    assert!(renderer.render(&skeleton).unwrap().draws.is_empty());
    assert_eq!(renderer.stats().skipped_transparent, 2);
}

#[test]
fn inactive_bone_hides_slot() {
    let page = page("a.png", false);
    let skeleton = Skeleton::new(
        vec![Bone { active: false, ..Bone::IDENTITY }],
        vec![Slot::new("quad", 0).with_attachment(quad("a", &page))],
    );
    assert!(build_draw_list(&skeleton).vertices.is_empty());
}

#[test]
fn dark_tint_follows_slot_dark_colors() {
    let page = page("a.png", true);
    let skeleton = skeleton(vec![
        Slot::new("dark", 0)
            .with_dark_color([0.2, 0.4, 0.6])
            .with_attachment(quad("a", &page)),
        Slot::new("plain", 0).with_attachment(quad("b", &page)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert!(draw_list.dark_tint);
    assert_eq!(draw_list.vertices[0].dark_color, [0.2, 0.4, 0.6, 1.0]);
    assert_eq!(draw_list.vertices[4].dark_color, NEUTRAL_DARK);

    let mut renderer = SkeletonRenderer::new(RenderConfig {
        dark_tint: DarkTint::Disabled,
        ..RenderConfig::default()
    });
    let draw_list = renderer.render(&skeleton).unwrap();
    assert!(!draw_list.dark_tint);
    assert_eq!(draw_list.vertices[0].dark_color, NEUTRAL_DARK);
}

#[test]
fn texel_uv_space_scales_by_page_size() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![Slot::new("quad", 0).with_attachment(quad("a", &page))]);
    let mut renderer = SkeletonRenderer::new(RenderConfig {
        uv_space: UvSpace::Texels,
        ..RenderConfig::default()
    });

    let draw_list = renderer.render(&skeleton).unwrap();
    assert_eq!(draw_list.vertices[0].uv, [64.0, 32.0]);
    assert_eq!(draw_list.vertices[2].uv, [0.0, 0.0]);
}

#[test]
fn draws_batch_by_texture_blend_and_pma() {
    let a = page("a.png", false);
    let b = page("b.png", false);
    let skeleton = skeleton(vec![
        Slot::new("0", 0).with_attachment(quad("0", &a)),
        Slot::new("1", 0).with_attachment(quad("1", &a)),
        Slot::new("2", 0).with_attachment(quad("2", &b)),
        Slot::new("3", 0)
            .with_blend(BlendMode::Additive)
            .with_attachment(quad("3", &b)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert_eq!(draw_list.draws.len(), 3);
    assert_eq!(draw_list.draws[0].index_count, 12);
    assert_eq!(draw_list.draws[1].texture.name, "b.png");
    assert_eq!(draw_list.draws[2].blend, BlendMode::Additive);
    assert_eq!(draw_list.draws[2].first_index, 18);

    let mut renderer = SkeletonRenderer::new(RenderConfig {
        batch_draws: false,
        ..RenderConfig::default()
    });
    assert_eq!(renderer.render(&skeleton).unwrap().draws.len(), 4);
}

#[test]
fn pages_with_equal_metadata_are_separate_draws() {
    let first = page("skeleton.png", false);
    let second = page("skeleton.png", false);
    assert_eq!(*first, *second);
    let skeleton = skeleton(vec![
        Slot::new("0", 0).with_attachment(quad("0", &first)),
        Slot::new("1", 0).with_attachment(quad("1", &first)),
        Slot::new("2", 0).with_attachment(quad("2", &second)),
    ]);

    let draw_list = build_draw_list(&skeleton);
    assert_eq!(draw_list.draws.len(), 2);
    assert!(draw_list.draws[0].uses_texture(&first));
    assert!(draw_list.draws[1].uses_texture(&second));
    assert_eq!(draw_list.draws[1].first_index, 12);

    let retextured = Draw {
        texture: Arc::clone(&second),
        ..draw_list.draws[0].clone()
    };
    assert_ne!(retextured, draw_list.draws[0]);
}

#[test]
fn packed_vertices_are_upload_ready() {
    let page = page("a.png", false);
    let skeleton = skeleton(vec![
        Slot::new("quad", 0)
            .with_color([1.0, 0.0, 0.0, 1.0])
            .with_attachment(quad("a", &page)),
    ]);
    let draw_list = build_draw_list(&skeleton);

    let mut packed = Vec::new();
    draw_list.pack_vertices(ColorPacking::Abgr8888, &mut packed);
    assert_eq!(packed.len(), 4);
    assert_eq!(packed[0].color, 0xff00_00ff);
    assert_eq!(packed[0].dark_color, 0xff00_0000);
    assert_eq!(bytemuck::cast_slice::<PackedVertex, u8>(&packed).len(), 4 * 24);
    assert_eq!(draw_list.index_bytes().len(), 6 * 4);
}

#[test]
fn render_after_dispose_fails() {
    let skeleton = skeleton(Vec::new());
    let mut renderer = SkeletonRenderer::default();
    assert!(renderer.render(&skeleton).unwrap().draws.is_empty());

    renderer.dispose();
    assert!(renderer.is_disposed());
    assert_eq!(renderer.render(&skeleton).unwrap_err(), Error::RendererDisposed);
}
