//! Standard CRC models.
//!
//! Parameters and check values follow the reveng catalogue.

use super::*;

macro_rules! crc_models {
    ($($ident:ident => ($name:literal, $width:literal, $poly:literal, $init:literal, $refin:literal, $refout:literal, $xorout:literal, $check:literal)),* $(,)?) => {
        $(
            pub static $ident: Crc = Crc::new(Algorithm {
                name: $name,
                width: $width,
                poly: $poly,
                init: $init,
                refin: $refin,
                refout: $refout,
                xorout: $xorout,
                check: $check,
            });
        )*

        /// Every model in the catalogue.
        pub static ALL: &[&Crc] = &[$(&$ident),*];
    };
}

crc_models! {
    CRC_8 => ("CRC-8", 8, 0x07, 0x00, false, false, 0x00, 0xf4),
    CRC_8_SAE_J1850 => ("CRC-8/SAE-J1850", 8, 0x1d, 0xff, false, false, 0xff, 0x4b),
    CRC_8_AUTOSAR => ("CRC-8/AUTOSAR", 8, 0x2f, 0xff, false, false, 0xff, 0xdf),
    CRC_8_CDMA2000 => ("CRC-8/CDMA2000", 8, 0x9b, 0xff, false, false, 0x00, 0xda),
    CRC_8_DARC => ("CRC-8/DARC", 8, 0x39, 0x00, true, true, 0x00, 0x15),
    CRC_8_DVB_S2 => ("CRC-8/DVB-S2", 8, 0xd5, 0x00, false, false, 0x00, 0xbc),
    CRC_8_EBU => ("CRC-8/EBU", 8, 0x1d, 0xff, true, true, 0x00, 0x97),
    CRC_8_I_CODE => ("CRC-8/I-CODE", 8, 0x1d, 0xfd, false, false, 0x00, 0x7e),
    CRC_8_ITU => ("CRC-8/ITU", 8, 0x07, 0x00, false, false, 0x55, 0xa1),
    CRC_8_MAXIM => ("CRC-8/MAXIM", 8, 0x31, 0x00, true, true, 0x00, 0xa1),
    CRC_8_ROHC => ("CRC-8/ROHC", 8, 0x07, 0xff, true, true, 0x00, 0xd0),
    CRC_8_WCDMA => ("CRC-8/WCDMA", 8, 0x9b, 0x00, true, true, 0x00, 0x25),
    CRC_16_CCITT_ZERO => ("CRC-16/CCITT-ZERO", 16, 0x1021, 0x0000, false, false, 0x0000, 0x31c3),
    CRC_16_ARC => ("CRC-16/ARC", 16, 0x8005, 0x0000, true, true, 0x0000, 0xbb3d),
    CRC_16_AUG_CCITT => ("CRC-16/AUG-CCITT", 16, 0x1021, 0x1d0f, false, false, 0x0000, 0xe5cc),
    CRC_16_BUYPASS => ("CRC-16/BUYPASS", 16, 0x8005, 0x0000, false, false, 0x0000, 0xfee8),
    CRC_16_CCITT_FALSE => ("CRC-16/CCITT-FALSE", 16, 0x1021, 0xffff, false, false, 0x0000, 0x29b1),
    CRC_16_CDMA2000 => ("CRC-16/CDMA2000", 16, 0xc867, 0xffff, false, false, 0x0000, 0x4c06),
    CRC_16_DDS_110 => ("CRC-16/DDS-110", 16, 0x8005, 0x800d, false, false, 0x0000, 0x9ecf),
    CRC_16_DECT_R => ("CRC-16/DECT-R", 16, 0x0589, 0x0000, false, false, 0x0001, 0x007e),
    CRC_16_DECT_X => ("CRC-16/DECT-X", 16, 0x0589, 0x0000, false, false, 0x0000, 0x007f),
    CRC_16_DNP => ("CRC-16/DNP", 16, 0x3d65, 0x0000, true, true, 0xffff, 0xea82),
    CRC_16_EN_13757 => ("CRC-16/EN-13757", 16, 0x3d65, 0x0000, false, false, 0xffff, 0xc2b7),
    CRC_16_GENIBUS => ("CRC-16/GENIBUS", 16, 0x1021, 0xffff, false, false, 0xffff, 0xd64e),
    CRC_16_MAXIM => ("CRC-16/MAXIM", 16, 0x8005, 0x0000, true, true, 0xffff, 0x44c2),
    CRC_16_MCRF4XX => ("CRC-16/MCRF4XX", 16, 0x1021, 0xffff, true, true, 0x0000, 0x6f91),
    CRC_16_RIELLO => ("CRC-16/RIELLO", 16, 0x1021, 0xb2aa, true, true, 0x0000, 0x63d0),
    CRC_16_T10_DIF => ("CRC-16/T10-DIF", 16, 0x8bb7, 0x0000, false, false, 0x0000, 0xd0db),
    CRC_16_TELEDISK => ("CRC-16/TELEDISK", 16, 0xa097, 0x0000, false, false, 0x0000, 0x0fb3),
    CRC_16_TMS37157 => ("CRC-16/TMS37157", 16, 0x1021, 0x89ec, true, true, 0x0000, 0x26b1),
    CRC_16_USB => ("CRC-16/USB", 16, 0x8005, 0xffff, true, true, 0xffff, 0xb4c8),
    CRC_16_A => ("CRC-A", 16, 0x1021, 0xc6c6, true, true, 0x0000, 0xbf05),
    CRC_16_KERMIT => ("CRC-16/KERMIT", 16, 0x1021, 0x0000, true, true, 0x0000, 0x2189),
    CRC_16_MODBUS => ("CRC-16/MODBUS", 16, 0x8005, 0xffff, true, true, 0x0000, 0x4b37),
    CRC_16_X25 => ("CRC-16/X-25", 16, 0x1021, 0xffff, true, true, 0xffff, 0x906e),
    CRC_16_XMODEM => ("CRC-16/XMODEM", 16, 0x1021, 0x0000, false, false, 0x0000, 0x31c3),
    CRC_32 => ("CRC-32", 32, 0x04c11db7, 0xffffffff, true, true, 0xffffffff, 0xcbf43926),
    CRC_32_BZIP2 => ("CRC-32/BZIP2", 32, 0x04c11db7, 0xffffffff, false, false, 0xffffffff, 0xfc891918),
    CRC_32_C => ("CRC-32C", 32, 0x1edc6f41, 0xffffffff, true, true, 0xffffffff, 0xe3069283),
    CRC_32_D => ("CRC-32D", 32, 0xa833982b, 0xffffffff, true, true, 0xffffffff, 0x87315576),
    CRC_32_MPEG_2 => ("CRC-32/MPEG-2", 32, 0x04c11db7, 0xffffffff, false, false, 0x00000000, 0x0376e6e7),
    CRC_32_POSIX => ("CRC-32/POSIX", 32, 0x04c11db7, 0x00000000, false, false, 0xffffffff, 0x765e7680),
    CRC_32_Q => ("CRC-32Q", 32, 0x814141ab, 0x00000000, false, false, 0x00000000, 0x3010bf7f),
    CRC_32_JAMCRC => ("CRC-32/JAMCRC", 32, 0x04c11db7, 0xffffffff, true, true, 0x00000000, 0x340bc6d9),
    CRC_32_XFER => ("CRC-32/XFER", 32, 0x000000af, 0x00000000, false, false, 0x00000000, 0xbd0be338),
}
