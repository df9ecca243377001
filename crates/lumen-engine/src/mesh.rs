//! Vertex-array meshes.

use std::rc::Rc;

use crate::context::{ContextError, VertexArrayId};
use crate::gl::{GlContext, VertexLayout};

/// Unit cube centred on the origin as 36 unindexed vertices: position
/// (`@location(0)`, 3 floats) then texture coordinate (`@location(1)`,
/// 2 floats).
#[rustfmt::skip]
pub const CUBE_VERTICES: [f32; 180] = [
    -0.5, -0.5, -0.5,  0.0, 0.0,
     0.5, -0.5, -0.5,  1.0, 0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 0.0,

    -0.5, -0.5,  0.5,  0.0, 0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 1.0,
     0.5,  0.5,  0.5,  1.0, 1.0,
    -0.5,  0.5,  0.5,  0.0, 1.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,

    -0.5,  0.5,  0.5,  1.0, 0.0,
    -0.5,  0.5, -0.5,  1.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,
    -0.5,  0.5,  0.5,  1.0, 0.0,

     0.5,  0.5,  0.5,  1.0, 0.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5,  0.5,  0.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,

    -0.5, -0.5, -0.5,  0.0, 1.0,
     0.5, -0.5, -0.5,  1.0, 1.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
     0.5, -0.5,  0.5,  1.0, 0.0,
    -0.5, -0.5,  0.5,  0.0, 0.0,
    -0.5, -0.5, -0.5,  0.0, 1.0,

    -0.5,  0.5, -0.5,  0.0, 1.0,
     0.5,  0.5, -0.5,  1.0, 1.0,
     0.5,  0.5,  0.5,  1.0, 0.0,
     0.5,  0.5,  0.5,  1.0, 0.0,
    -0.5,  0.5,  0.5,  0.0, 0.0,
    -0.5,  0.5, -0.5,  0.0, 1.0,
];

/// Layout of [`CUBE_VERTICES`].
pub fn cube_layout() -> VertexLayout {
    VertexLayout::packed_f32(&[(0, 3), (1, 2)])
}

/// A vertex array on a [`GlContext`], deleted on drop.
pub struct Mesh {
    gl: Rc<GlContext>,
    id: VertexArrayId,
    vertex_count: u32,
}

impl Mesh {
    pub fn new(
        gl: &Rc<GlContext>,
        layout: VertexLayout,
        vertices: &[f32],
    ) -> Result<Self, ContextError> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_count = layout.vertex_count(bytes.len());
        let id = gl.create_vertex_array(layout, bytes)?;

        Ok(Self {
            gl: Rc::clone(gl),
            id,
            vertex_count,
        })
    }

    /// The textured unit cube.
    pub fn cube(gl: &Rc<GlContext>) -> Result<Self, ContextError> {
        Self::new(gl, cube_layout(), &CUBE_VERTICES)
    }

    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn bind(&self) -> Result<(), ContextError> {
        self.gl.bind_vertex_array(Some(self.id))
    }

    /// Binds the mesh and draws all of its vertices with the active program.
    pub fn draw(&self) -> Result<(), ContextError> {
        self.bind()?;
        self.gl.draw_arrays(0, self.vertex_count)
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_36_vertices() {
        let layout = cube_layout();
        assert_eq!(layout.vertex_count(CUBE_VERTICES.len() * 4), 36);
    }

    #[test]
    fn cube_positions_stay_on_the_unit_cube() {
        for vertex in CUBE_VERTICES.chunks(5) {
            assert!(vertex[..3].iter().all(|c| c.abs() == 0.5));
            assert!(vertex[3..].iter().all(|c| *c == 0.0 || *c == 1.0));
        }
    }
}
