use super::BufferPool;
use crate::error::NavError;

/// Bytes per pixel of a packed RGB frame.
const CHANNELS: usize = 3;

/// One packed RGB8 camera frame, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, NavError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(NavError::InvalidFrame {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGB triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Nearest-neighbour resize into a buffer taken from `pool`.
    ///
    /// Hand the result back with [`Frame::recycle`] once it is no longer
    /// needed.
    pub fn resize_with(&self, width: u32, height: u32, pool: &mut BufferPool) -> Frame {
        let len = width as usize * height as usize * CHANNELS;
        let mut data = pool.take(width, height, len);
        if width == self.width && height == self.height {
            data.copy_from_slice(&self.data);
        } else if self.width > 0 && self.height > 0 {
            let (sw, sh) = (self.width as usize, self.height as usize);
            for y in 0..height as usize {
                let sy = y * sh / height as usize;
                for x in 0..width as usize {
                    let sx = x * sw / width as usize;
                    let src = (sy * sw + sx) * CHANNELS;
                    let dst = (y * width as usize + x) * CHANNELS;
                    data[dst..dst + CHANNELS].copy_from_slice(&self.data[src..src + CHANNELS]);
                }
            }
        }
        Frame {
            width,
            height,
            data,
        }
    }

    /// Nearest-neighbour resize into a fresh buffer.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        self.resize_with(width, height, &mut BufferPool::new(1))
    }

    /// Return this frame's buffer to `pool`.
    pub fn recycle(self, pool: &mut BufferPool) {
        pool.recycle(self.width, self.height, self.data);
    }
}
