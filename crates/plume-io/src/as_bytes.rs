use glam::{Vec3, Vec4};

/// Fixed-size little-endian encoding of a recorded value.
pub trait AsBytes<const N: usize> {
    fn from_bytes(b: [u8; N]) -> Self;

    fn to_bytes(self) -> [u8; N];
}

impl AsBytes<1> for u8 {
    fn from_bytes(b: [u8; 1]) -> Self {
        b[0]
    }

    fn to_bytes(self) -> [u8; 1] {
        [self]
    }
}

impl AsBytes<4> for u32 {
    fn from_bytes(b: [u8; 4]) -> Self {
        u32::from_le_bytes(b)
    }

    fn to_bytes(self) -> [u8; 4] {
        self.to_le_bytes()
    }
}

impl AsBytes<8> for u64 {
    fn from_bytes(b: [u8; 8]) -> Self {
        u64::from_le_bytes(b)
    }

    fn to_bytes(self) -> [u8; 8] {
        self.to_le_bytes()
    }
}

impl AsBytes<4> for f32 {
    fn from_bytes(b: [u8; 4]) -> Self {
        f32::from_le_bytes(b)
    }

    fn to_bytes(self) -> [u8; 4] {
        self.to_le_bytes()
    }
}

impl AsBytes<12> for Vec3 {
    fn from_bytes(b: [u8; 12]) -> Self {
        Vec3::new(component(&b, 0), component(&b, 1), component(&b, 2))
    }

    fn to_bytes(self) -> [u8; 12] {
        let mut out = [0; 12];
        write_components(&mut out, &self.to_array());
        out
    }
}

impl AsBytes<16> for Vec4 {
    fn from_bytes(b: [u8; 16]) -> Self {
        Vec4::new(component(&b, 0), component(&b, 1), component(&b, 2), component(&b, 3))
    }

    fn to_bytes(self) -> [u8; 16] {
        let mut out = [0; 16];
        write_components(&mut out, &self.to_array());
        out
    }
}

#[inline]
fn component(b: &[u8], i: usize) -> f32 {
    let at = 4 * i;
    f32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

#[inline]
fn write_components(out: &mut [u8], values: &[f32]) {
    for (chunk, v) in out.chunks_exact_mut(4).zip(values) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}
