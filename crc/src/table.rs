use super::*;

/// Table for the MSB-first algorithm. Entries are left-aligned in the 64-bit
/// register so that every width shares the same update loop.
pub(crate) fn direct(alg: &Algorithm) -> [u64; 256] {
    let shift = 64 - alg.width as u32;
    let poly = (alg.poly & alg.mask()) << shift;
    let mut table = [0u64; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut r = (i as u64) << 56;
        for _ in 0..8 {
            r = if r & (1 << 63) != 0 {
                (r << 1) ^ poly
            } else {
                r << 1
            };
        }
        *entry = r;
    }
    table
}

/// Table for the LSB-first algorithm, using the reflected polynomial.
pub(crate) fn reflected(alg: &Algorithm) -> [u64; 256] {
    let poly = reflect(alg.poly & alg.mask(), alg.width);
    let mut table = [0u64; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut r = i as u64;
        for _ in 0..8 {
            r = if r & 1 != 0 { (r >> 1) ^ poly } else { r >> 1 };
        }
        *entry = r;
    }
    table
}

pub(crate) fn update_direct(table: &[u64; 256], mut register: u64, refin: bool, data: &[u8]) -> u64 {
    for &b in data {
        let b = if refin { b.reverse_bits() } else { b };
        let idx = ((register >> 56) as u8) ^ b;
        register = (register << 8) ^ table[idx as usize];
    }
    register
}

pub(crate) fn update_reflected(table: &[u64; 256], mut register: u64, data: &[u8]) -> u64 {
    for &b in data {
        let idx = (register as u8) ^ b;
        register = (register >> 8) ^ table[idx as usize];
    }
    register
}
