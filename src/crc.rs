//! CRC-32 used to protect serial frame payloads
//!
//! This is the reflected CRC-32 (polynomial `0xEDB88320`, init and final XOR
//! `0xFFFFFFFF`) from the PNG/zlib specifications, so host tools can use any
//! standard implementation (e.g. Python's `zlib.crc32`).

/// Checksum generator
///
/// In principle this is similar to [`core::hash::Hasher`] but allows to use output
/// different than u64.
pub trait ChecksumGen {
    /// Checksum type (e.g. [`u32`])
    type Output: Copy + PartialEq;

    /// Reset internal state to start generating checksum for new data
    fn reset(&mut self);

    /// Push data from slice to the generator
    ///
    /// Note that with this method one must ensure correct state by calling
    /// [`Self::reset`] before any [`Self::push`] sequence followed by
    /// [`Self::get`].
    fn push(&mut self, data: &[u8]);

    /// Retrieve checksum generation result for all data since last [`Self::reset`]
    fn get(&self) -> Self::Output;

    /// Compute checksum of `data` from a clean state
    fn checksum(&mut self, data: &[u8]) -> Self::Output
    where
        Self: Sized,
    {
        self.reset();
        self.push(data);
        self.get()
    }
}

/// Table-driven CRC-32 engine
///
/// The 256-entry lookup table is built when the engine is constructed, which
/// for a `const` or `static` engine happens at compile time.
pub struct Crc32 {
    table: [u32; 256],
    state: u32,
}

impl Crc32 {
    /// Reversed representation of the 0x04C11DB7 polynomial
    pub const POLY: u32 = 0xedb8_8320;
    const INIT: u32 = 0xffff_ffff;
    const XOR_OUT: u32 = 0xffff_ffff;

    pub const fn new() -> Self {
        Self {
            table: Self::make_table(),
            state: Self::INIT,
        }
    }

    const fn make_table() -> [u32; 256] {
        let mut table = [0u32; 256];
        let mut n = 0;
        while n < 256 {
            let mut c = n as u32;
            let mut k = 0;
            while k < 8 {
                c = if c & 1 != 0 {
                    Self::POLY ^ (c >> 1)
                } else {
                    c >> 1
                };
                k += 1;
            }
            table[n] = c;
            n += 1;
        }
        table
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecksumGen for Crc32 {
    type Output = u32;

    fn reset(&mut self) {
        self.state = Self::INIT;
    }

    fn push(&mut self, data: &[u8]) {
        self.state = data.iter().fold(self.state, |c, &byte| {
            self.table[((c ^ byte as u32) & 0xff) as usize] ^ (c >> 8)
        });
    }

    fn get(&self) -> Self::Output {
        self.state ^ Self::XOR_OUT
    }
}
