use super::Display;

pub const FRAME_BUFFER_PIXEL_WIDTH: usize = 64;
pub const FRAME_BUFFER_PIXEL_HEIGHT: usize = 32;

/// 64x32 monochrome framebuffer stored one byte per pixel, row major.
pub struct FramebufferDisplay {
    framebuffer: [u8; FRAME_BUFFER_PIXEL_WIDTH * FRAME_BUFFER_PIXEL_HEIGHT],
    dirty: bool,
}

impl Default for FramebufferDisplay {
    fn default() -> Self {
        Self {
            framebuffer: [0; FRAME_BUFFER_PIXEL_WIDTH * FRAME_BUFFER_PIXEL_HEIGHT],
            dirty: true,
        }
    }
}

impl Display for FramebufferDisplay {
    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn is_pixel_on(&self, x: usize, y: usize) -> bool {
        self.framebuffer[(y % FRAME_BUFFER_PIXEL_HEIGHT) * FRAME_BUFFER_PIXEL_WIDTH
            + (x % FRAME_BUFFER_PIXEL_WIDTH)]
            == 1
    }

    fn rgba_framebuffer(&self) -> Vec<u32> {
        self.framebuffer
            .iter()
            .map(|&byte| if byte == 1 { 0x00_FF_FF_FF } else { 0x00_00_00_00 })
            .collect()
    }

    fn cls(&mut self) {
        self.framebuffer = [0; FRAME_BUFFER_PIXEL_WIDTH * FRAME_BUFFER_PIXEL_HEIGHT];
        self.dirty = true;
    }

    fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        self.dirty = true;

        // Collision is accumulated over the whole sprite, not per row.
        sprite
            .iter()
            .enumerate()
            .fold(false, |did_collide, (y_offset, &row)| {
                let y_norm = (y as usize + y_offset) % FRAME_BUFFER_PIXEL_HEIGHT;
                (0..8_usize).fold(did_collide, |did_collide, x_bit| {
                    if (row >> (7 - x_bit)) & 0x1 == 0 {
                        return did_collide;
                    }

                    let x_norm = (x as usize + x_bit) % FRAME_BUFFER_PIXEL_WIDTH;
                    let pixel = &mut self.framebuffer[y_norm * FRAME_BUFFER_PIXEL_WIDTH + x_norm];
                    let was_on = *pixel == 1;
                    *pixel ^= 1;

                    did_collide || was_on
                })
            })
    }
}
