use crate::{Error, Skeleton, Slot, TextureRegion};

/// Fan covering a region quad in BR, BL, UL, UR order.
pub const QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 3, 0];

const DEFAULT_QUAD_UVS: [f32; 8] = [1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0];

#[derive(Clone, Debug, PartialEq)]
pub struct VertexWeight {
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MeshVertices {
    /// Positions in the slot bone's local space.
    Unweighted(Vec<[f32; 2]>),
    /// Per vertex, the bone influences that blend its world position.
    Weighted(Vec<Vec<VertexWeight>>),
}

impl MeshVertices {
    pub fn len(&self) -> usize {
        match self {
            MeshVertices::Unweighted(points) => points.len(),
            MeshVertices::Weighted(weights) => weights.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn world_vertices_length(&self) -> usize {
        self.len() * 2
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegionAttachment {
    pub name: String,
    pub texture: Option<TextureRegion>,
    pub color: [f32; 4],
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub width: f32,
    pub height: f32,
    offsets: [f32; 8],
    uvs: [f32; 8],
}

impl RegionAttachment {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        let mut region = Self {
            name: name.into(),
            texture: None,
            color: [1.0, 1.0, 1.0, 1.0],
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width,
            height,
            offsets: [0.0; 8],
            uvs: DEFAULT_QUAD_UVS,
        };
        region.update_region();
        region
    }

    pub fn with_texture(mut self, texture: TextureRegion) -> Self {
        self.texture = Some(texture);
        self.update_region();
        self
    }

    pub fn with_transform(
        mut self,
        x: f32,
        y: f32,
        rotation: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> Self {
        self.x = x;
        self.y = y;
        self.rotation = rotation;
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self.update_region();
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Local quad corners (BR, BL, UL, UR) relative to the slot bone.
    pub fn offsets(&self) -> &[f32; 8] {
        &self.offsets
    }

    pub fn uvs(&self) -> &[f32; 8] {
        &self.uvs
    }

    /// Recomputes the cached local corners and UVs. Call after mutating the
    /// public transform fields or the texture.
    pub fn update_region(&mut self) {
        let half_w = self.width * 0.5;
        let half_h = self.height * 0.5;

        let (mut left, mut bottom) = (-half_w * self.scale_x, -half_h * self.scale_y);
        let (mut right, mut top) = (half_w * self.scale_x, half_h * self.scale_y);

        // Whitespace-stripped regions only cover part of the authored rect.
        if let Some(texture) = &self.texture {
            let sx = self.width / texture.original_width.max(1) as f32 * self.scale_x;
            let sy = self.height / texture.original_height.max(1) as f32 * self.scale_y;
            left += texture.offset_x as f32 * sx;
            bottom += texture.offset_y as f32 * sy;
            right = left + texture.width as f32 * sx;
            top = bottom + texture.height as f32 * sy;
        }

        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let corner = |lx: f32, ly: f32| {
            (
                lx * cos - ly * sin + self.x,
                lx * sin + ly * cos + self.y,
            )
        };

        let corners = [
            corner(right, bottom),
            corner(left, bottom),
            corner(left, top),
            corner(right, top),
        ];
        for (i, (x, y)) in corners.into_iter().enumerate() {
            self.offsets[i * 2] = x;
            self.offsets[i * 2 + 1] = y;
        }

        self.uvs = self
            .texture
            .as_ref()
            .map_or(DEFAULT_QUAD_UVS, TextureRegion::quad_uvs);
    }
}

/// Textured triangle mesh.
///
/// Geometry is checked once by [`MeshAttachment::new`] and is read-only
/// afterwards, so triangle indices always address existing vertices:
///
/// ```compile_fail
/// # use spine2d_mesh::{MeshAttachment, MeshVertices};
/// let mut mesh = MeshAttachment::new(
///     "m",
///     MeshVertices::Unweighted(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
///     vec![[0.0, 0.0]; 3],
///     vec![0, 1, 2],
/// )
/// .unwrap();
/// mesh.triangles.push(7);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MeshAttachment {
    pub name: String,
    pub texture: Option<TextureRegion>,
    pub color: [f32; 4],
    vertices: MeshVertices,
    region_uvs: Vec<[f32; 2]>,
    triangles: Vec<u16>,
    uvs: Vec<f32>,
}

impl MeshAttachment {
    pub fn new(
        name: impl Into<String>,
        vertices: MeshVertices,
        region_uvs: Vec<[f32; 2]>,
        triangles: Vec<u16>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let vertex_count = vertices.len();
        if region_uvs.len() != vertex_count {
            return Err(Error::invalid_attachment(
                &name,
                format!("{} uvs for {vertex_count} vertices", region_uvs.len()),
            ));
        }
        if triangles.len() % 3 != 0 {
            return Err(Error::invalid_attachment(
                &name,
                format!("triangle index count {} is not a multiple of 3", triangles.len()),
            ));
        }
        if let Some(&index) = triangles.iter().find(|&&i| usize::from(i) >= vertex_count) {
            return Err(Error::invalid_attachment(
                &name,
                format!("triangle index {index} out of range for {vertex_count} vertices"),
            ));
        }

        let mut mesh = Self {
            name,
            texture: None,
            color: [1.0, 1.0, 1.0, 1.0],
            vertices,
            region_uvs,
            triangles,
            uvs: Vec::new(),
        };
        mesh.update_region();
        Ok(mesh)
    }

    pub fn with_texture(mut self, texture: TextureRegion) -> Self {
        self.texture = Some(texture);
        self.update_region();
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn world_vertices_length(&self) -> usize {
        self.vertices.world_vertices_length()
    }

    pub fn vertices(&self) -> &MeshVertices {
        &self.vertices
    }

    /// Authored UVs relative to the original image.
    pub fn region_uvs(&self) -> &[[f32; 2]] {
        &self.region_uvs
    }

    pub fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    /// Page-space UVs, interleaved.
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Recomputes the page-space UVs. Call after replacing the texture.
    pub fn update_region(&mut self) {
        self.uvs.clear();
        self.uvs.reserve(self.region_uvs.len() * 2);
        for &uv in &self.region_uvs {
            let [u, v] = match &self.texture {
                Some(texture) => texture.map_mesh_uv(uv),
                None => uv,
            };
            self.uvs.push(u);
            self.uvs.push(v);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClippingAttachment {
    pub name: String,
    pub vertices: MeshVertices,
    /// Slot index after which clipping stops. `None` clips to the end of the draw order.
    pub end_slot: Option<usize>,
}

impl ClippingAttachment {
    pub fn new(
        name: impl Into<String>,
        vertices: MeshVertices,
        end_slot: Option<usize>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if vertices.len() < 3 {
            return Err(Error::invalid_attachment(
                &name,
                format!("clipping polygon needs 3 vertices, got {}", vertices.len()),
            ));
        }
        Ok(Self {
            name,
            vertices,
            end_slot,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointAttachment {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBoxAttachment {
    pub name: String,
    pub vertices: MeshVertices,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathAttachment {
    pub name: String,
    pub vertices: MeshVertices,
    pub closed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Attachment {
    Region(RegionAttachment),
    Mesh(MeshAttachment),
    Clipping(ClippingAttachment),
    Point(PointAttachment),
    BoundingBox(BoundingBoxAttachment),
    Path(PathAttachment),
}

impl Attachment {
    pub fn name(&self) -> &str {
        match self {
            Attachment::Region(a) => &a.name,
            Attachment::Mesh(a) => &a.name,
            Attachment::Clipping(a) => &a.name,
            Attachment::Point(a) => &a.name,
            Attachment::BoundingBox(a) => &a.name,
            Attachment::Path(a) => &a.name,
        }
    }

    /// The drawable view of this attachment, if it produces triangles.
    pub fn as_renderable(&self) -> Option<&dyn RenderableAttachment> {
        match self {
            Attachment::Region(region) => Some(region),
            Attachment::Mesh(mesh) => Some(mesh),
            Attachment::Clipping(_)
            | Attachment::Point(_)
            | Attachment::BoundingBox(_)
            | Attachment::Path(_) => None,
        }
    }
}

/// Capabilities every attachment that emits triangles provides.
pub trait RenderableAttachment {
    fn name(&self) -> &str;

    fn texture(&self) -> Option<&TextureRegion>;

    /// Authored straight-alpha tint.
    fn color(&self) -> [f32; 4];

    /// Interleaved page-space UVs, one pair per world vertex.
    fn uvs(&self) -> &[f32];

    fn triangles(&self) -> &[u16];

    fn world_vertices_length(&self) -> usize;

    /// Writes `world_vertices_length()` floats into `out` starting at `offset`,
    /// advancing `stride` floats per vertex. `out` must already be large enough.
    fn compute_world_vertices(
        &self,
        skeleton: &Skeleton,
        slot: &Slot,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    );
}

impl RenderableAttachment for RegionAttachment {
    fn name(&self) -> &str {
        &self.name
    }

    fn texture(&self) -> Option<&TextureRegion> {
        self.texture.as_ref()
    }

    fn color(&self) -> [f32; 4] {
        self.color
    }

    fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    fn triangles(&self) -> &[u16] {
        &QUAD_TRIANGLES
    }

    fn world_vertices_length(&self) -> usize {
        8
    }

    fn compute_world_vertices(
        &self,
        skeleton: &Skeleton,
        slot: &Slot,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    ) {
        let bone = skeleton.bones.get(slot.bone).copied().unwrap_or_default();
        RegionAttachment::compute_world_vertices(self, &bone, out, offset, stride);
    }
}

impl RenderableAttachment for MeshAttachment {
    fn name(&self) -> &str {
        &self.name
    }

    fn texture(&self) -> Option<&TextureRegion> {
        self.texture.as_ref()
    }

    fn color(&self) -> [f32; 4] {
        self.color
    }

    fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    fn triangles(&self) -> &[u16] {
        &self.triangles
    }

    fn world_vertices_length(&self) -> usize {
        MeshAttachment::world_vertices_length(self)
    }

    fn compute_world_vertices(
        &self,
        skeleton: &Skeleton,
        slot: &Slot,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    ) {
        crate::compute_mesh_world_vertices(
            skeleton,
            slot,
            &self.vertices,
            0,
            self.world_vertices_length(),
            out,
            offset,
            stride,
        );
    }
}
