use super::*;
use hex_literal::hex;

const CHECK_INPUT: &[u8] = b"123456789";
const HELLO: &[u8] = b"Hello world!";

// Bit-at-a-time polynomial division
fn long_division(alg: &Algorithm, data: &[u8]) -> u64 {
    let m = mask(alg.width);
    let mut crc = alg.init & m;
    for &b in data {
        let b = if alg.refin { b.reverse_bits() } else { b };
        for i in (0..8).rev() {
            let bit = ((crc >> (alg.width - 1)) & 1) ^ (((b as u64) >> i) & 1);
            crc = (crc << 1) & m;
            if bit != 0 {
                crc ^= alg.poly & m;
            }
        }
    }
    if alg.refout {
        crc = reflect(crc, alg.width);
    }
    (crc ^ alg.xorout) & m
}

fn sample_inputs() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        vec![0],
        vec![0xFF],
        CHECK_INPUT.to_vec(),
        HELLO.to_vec(),
        (0..=255u8).collect(),
        (0..1000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect(),
    ]
}

#[test]
fn reference_vectors() {
    assert_eq!(CRC_16_X25.checksum(HELLO), 0x8edb);
    assert_eq!(CRC_32.checksum(HELLO), 0x1b851995);
    assert_eq!(CRC_16_CCITT_ZERO.checksum(HELLO), 0x39db);
    assert_eq!(CRC_16_CCITT_FALSE.checksum(HELLO), 0xbd22);
    assert_eq!(CRC_32_C.checksum(HELLO), 0x7b98e751);
}

#[test]
fn split_input() {
    // "123456789" as it would arrive in pieces off the wire
    let data = hex!("31323334 35 363738 39");
    assert_eq!(&data[..], CHECK_INPUT);
    for (crc, check) in [
        (&CRC_32, 0xcbf43926),
        (&CRC_32_C, 0xe3069283),
        (&CRC_16_X25, 0x906e),
        (&CRC_16_CCITT_FALSE, 0x29b1),
    ] {
        let mut digest = crc.digest();
        for piece in [&data[..4], &data[4..5], &data[5..8], &data[8..]] {
            digest.update(piece);
        }
        assert_eq!(digest.finalize(), check, "{}", crc.algorithm().name);
    }
}

#[test]
fn catalogue_check_values() {
    for crc in ALL {
        let alg = crc.algorithm();
        assert_eq!(crc.checksum(CHECK_INPUT), alg.check, "{}", alg.name);
    }
}

#[test]
fn matches_long_division() {
    let inputs = sample_inputs();
    for crc in ALL {
        for input in &inputs {
            assert_eq!(
                crc.checksum(input),
                long_division(crc.algorithm(), input),
                "{} over {} bytes",
                crc.algorithm().name,
                input.len()
            );
        }
    }
}

#[test]
fn reflected_and_direct_paths_agree() {
    let inputs = sample_inputs();
    for crc in ALL.iter().filter(|c| c.algorithm().is_reflected()) {
        let alg = crc.algorithm();
        let table = table::direct(alg);
        for input in &inputs {
            let register = (alg.init & alg.mask()) << (64 - alg.width as u32);
            let register = table::update_direct(&table, register, true, input);
            let direct = (reflect(register >> (64 - alg.width as u32), alg.width) ^ alg.xorout)
                & alg.mask();
            assert_eq!(crc.checksum(input), direct, "{}", alg.name);
        }
    }
}

#[test]
fn unusual_widths() {
    let models = [
        Algorithm {
            name: "CRC-5/USB",
            width: 5,
            poly: 0x05,
            init: 0x1f,
            refin: true,
            refout: true,
            xorout: 0x1f,
            check: 0x19,
        },
        Algorithm {
            name: "CRC-7/MMC",
            width: 7,
            poly: 0x09,
            init: 0,
            refin: false,
            refout: false,
            xorout: 0,
            check: 0x75,
        },
        Algorithm {
            name: "CRC-12/UMTS",
            width: 12,
            poly: 0x80f,
            init: 0,
            refin: false,
            refout: true,
            xorout: 0,
            check: 0xdaf,
        },
        Algorithm {
            name: "CRC-64/XZ",
            width: 64,
            poly: 0x42f0e1eba9ea3693,
            init: u64::MAX,
            refin: true,
            refout: true,
            xorout: u64::MAX,
            check: 0x995dc9bbdf1939fa,
        },
    ];
    for alg in models {
        let crc = Crc::try_new(alg).expect("Valid width");
        assert_eq!(crc.checksum(CHECK_INPUT), alg.check, "{}", alg.name);
        for input in sample_inputs() {
            assert_eq!(crc.checksum(&input), long_division(&alg, &input), "{}", alg.name);
        }
    }
}

#[test]
fn invalid_width() {
    let mut alg = *CRC_16_X25.algorithm();
    alg.width = 0;
    assert_eq!(Crc::try_new(alg).err(), Some(Error::InvalidWidth(0)));
    alg.width = 65;
    assert_eq!(Crc::try_new(alg).err(), Some(Error::InvalidWidth(65)));
}

#[test]
fn incremental_digest() {
    let data: Vec<u8> = (0..=255u8).cycle().take(777).collect();
    for crc in [&CRC_16_X25, &CRC_32_C, &CRC_16_CCITT_FALSE, &CRC_32_BZIP2] {
        let mut digest = crc.digest();
        for chunk in data.chunks(13) {
            digest.update(chunk);
        }
        assert_eq!(digest.finalize(), crc.checksum(&data));
    }
}

#[test]
fn agrees_with_crc_crate() {
    for input in sample_inputs() {
        assert_eq!(
            CRC_16_X25.checksum(&input),
            ::crc::Crc::<u16>::new(&::crc::CRC_16_IBM_SDLC).checksum(&input) as u64
        );
        assert_eq!(
            CRC_16_CCITT_FALSE.checksum(&input),
            ::crc::Crc::<u16>::new(&::crc::CRC_16_IBM_3740).checksum(&input) as u64
        );
        assert_eq!(
            CRC_16_XMODEM.checksum(&input),
            ::crc::Crc::<u16>::new(&::crc::CRC_16_XMODEM).checksum(&input) as u64
        );
        assert_eq!(
            CRC_32.checksum(&input),
            ::crc::Crc::<u32>::new(&::crc::CRC_32_ISO_HDLC).checksum(&input) as u64
        );
        assert_eq!(
            CRC_32_C.checksum(&input),
            ::crc::Crc::<u32>::new(&::crc::CRC_32_ISCSI).checksum(&input) as u64
        );
        assert_eq!(
            CRC_32_MPEG_2.checksum(&input),
            ::crc::Crc::<u32>::new(&::crc::CRC_32_MPEG_2).checksum(&input) as u64
        );
        assert_eq!(
            CRC_8_MAXIM.checksum(&input),
            ::crc::Crc::<u8>::new(&::crc::CRC_8_MAXIM_DOW).checksum(&input) as u64
        );
    }
}

#[test]
fn table_is_cached() {
    let crc = Crc::new(*CRC_16_KERMIT.algorithm());
    assert!(crc.table.get().is_none());
    crc.checksum(HELLO);
    let first = crc.table() as *const _;
    crc.checksum(CHECK_INPUT);
    assert_eq!(first, crc.table() as *const _);
}
