//! Builds a small clipped skeleton by hand and prints the resulting draw list.

use spine2d_mesh::{
    Attachment, BlendMode, Bone, ClippingAttachment, ColorPacking, MeshAttachment, MeshVertices,
    RegionAttachment, RenderConfig, Skeleton, SkeletonRenderer, Slot, TexturePage, TextureRegion,
};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let page = Arc::new(TexturePage::new("hero.png", 256, 128, true));
    let body = TextureRegion::new(Arc::clone(&page), 0, 0, 128, 128);
    let glow = TextureRegion::new(Arc::clone(&page), 128, 0, 64, 64);

    let body = RegionAttachment::new("body", 100.0, 100.0).with_texture(body);
    let glow = MeshAttachment::new(
        "glow",
        MeshVertices::Unweighted(vec![[-60.0, -20.0], [60.0, -20.0], [60.0, 20.0], [-60.0, 20.0]]),
        vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        vec![0, 1, 2, 2, 3, 0],
    )?
    .with_texture(glow);
    let mask = ClippingAttachment::new(
        "mask",
        MeshVertices::Unweighted(vec![[-40.0, -40.0], [40.0, -40.0], [0.0, 50.0]]),
        Some(2),
    )?;

    let skeleton = Skeleton::new(
        vec![Bone::IDENTITY, Bone::from_transform(0.0, 10.0, 15.0, 1.0, 1.0)],
        vec![
            Slot::new("mask", 0).with_attachment(Attachment::Clipping(mask)),
            Slot::new("body", 0).with_attachment(Attachment::Region(body)),
            Slot::new("glow", 1)
                .with_color([1.0, 0.8, 0.2, 0.75])
                .with_dark_color([0.1, 0.0, 0.2])
                .with_blend(BlendMode::Additive)
                .with_attachment(Attachment::Mesh(glow)),
        ],
    );

    let mut renderer = SkeletonRenderer::new(RenderConfig::default());
    let draw_list = renderer.render(&skeleton)?;

    println!(
        "{} vertices, {} indices, {} draws (dark tint: {})",
        draw_list.vertices.len(),
        draw_list.indices.len(),
        draw_list.draws.len(),
        draw_list.dark_tint
    );
    for draw in &draw_list.draws {
        println!(
            "  {} {:?} pma={} indices {}..{}",
            draw.texture.name,
            draw.blend,
            draw.premultiplied_alpha,
            draw.first_index,
            draw.first_index + draw.index_count
        );
    }

    let mut packed = Vec::new();
    draw_list.pack_vertices(ColorPacking::Abgr8888, &mut packed);
    for (vertex, packed) in draw_list.vertices.iter().zip(&packed) {
        println!(
            "  pos ({:8.2}, {:8.2}) uv ({:.3}, {:.3}) color {:08x} dark {:08x}",
            vertex.position[0],
            vertex.position[1],
            vertex.uv[0],
            vertex.uv[1],
            packed.color,
            packed.dark_color
        );
    }

    println!("{:?}", renderer.stats());
    Ok(())
}
