use std::rc::Rc;

use glow::HasContext;

use super::GlowBackend;

/// Floats per vertex (`in_Vertex` is a `vec3`).
const COMPONENTS: usize = 3;
const VERTEX_COUNT: usize = 6;

/// Two triangles covering `0..width` by `0..height` at depth zero.
pub(crate) fn quad_vertices(width: u32, height: u32) -> [f32; VERTEX_COUNT * COMPONENTS] {
    let (w, h) = (width as f32, height as f32);
    #[rustfmt::skip]
    let vertices = [
        0.0, 0.0, 0.0,
        w,   0.0, 0.0,
        w,   h,   0.0,
        0.0, 0.0, 0.0,
        0.0, h,   0.0,
        w,   h,   0.0,
    ];
    vertices
}

/// Vertex array and buffer holding the screen quad for one viewport size.
pub(crate) struct ScreenQuad {
    backend: Rc<GlowBackend>,
    vertex_array: glow::NativeVertexArray,
    buffer: glow::NativeBuffer,
}

impl ScreenQuad {
    pub(crate) fn new(backend: &Rc<GlowBackend>, width: u32, height: u32) -> Result<Self, String> {
        let gl = backend.context();
        let vertices = quad_vertices(width, height);
        unsafe {
            let vertex_array = gl.create_vertex_array()?;
            let buffer = match gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(err) => {
                    gl.delete_vertex_array(vertex_array);
                    return Err(err);
                }
            };

            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STATIC_DRAW,
            );
            gl.vertex_attrib_pointer_f32(
                0,
                COMPONENTS as i32,
                glow::FLOAT,
                false,
                (COMPONENTS * std::mem::size_of::<f32>()) as i32,
                0,
            );
            gl.enable_vertex_attrib_array(0);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(Self {
                backend: Rc::clone(backend),
                vertex_array,
                buffer,
            })
        }
    }

    pub(crate) fn draw(&self) {
        let gl = self.backend.context();
        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_arrays(glow::TRIANGLES, 0, VERTEX_COUNT as i32);
            gl.bind_vertex_array(None);
        }
    }
}

impl Drop for ScreenQuad {
    fn drop(&mut self) {
        let gl = self.backend.context();
        unsafe {
            gl.delete_buffer(self.buffer);
            gl.delete_vertex_array(self.vertex_array);
        }
    }
}
