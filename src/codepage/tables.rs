//! Upper halves (0x80..=0xFF) of the single-byte code pages that `encoding` does not ship:
//! the DOS (OEM) pages and ISO 8859-9.
//!
//! The lower half of each of these is plain ASCII. `0x0000` marks a byte with no mapping.

pub(crate) struct OemTable {
    pub(crate) code_page: u32,
    pub(crate) name: &'static str,
    pub(crate) high: [u16; 128],
}

const BOX_B0: [u16; 16] = [
    0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x2561, 0x2562, 0x2556, 0x2555, 0x2563, 0x2551,
    0x2557, 0x255D, 0x255C, 0x255B, 0x2510,
];
const BOX_C0: [u16; 16] = [
    0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x255E, 0x255F, 0x255A, 0x2554, 0x2569,
    0x2566, 0x2560, 0x2550, 0x256C, 0x2567,
];
const BOX_D0: [u16; 16] = [
    0x2568, 0x2564, 0x2565, 0x2559, 0x2558, 0x2552, 0x2553, 0x256B, 0x256A, 0x2518, 0x250C,
    0x2588, 0x2584, 0x258C, 0x2590, 0x2580,
];

const fn assemble(rows: [[u16; 16]; 8]) -> [u16; 128] {
    let mut out = [0u16; 128];
    let mut r = 0;
    while r < 8 {
        let mut c = 0;
        while c < 16 {
            out[r * 16 + c] = rows[r][c];
            c += 1;
        }
        r += 1;
    }
    out
}

pub(crate) static CP437: OemTable = OemTable {
    code_page: 437,
    name: "ibm437",
    high: assemble([
        [
            0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7, 0x00EA, 0x00EB,
            0x00E8, 0x00EF, 0x00EE, 0x00EC, 0x00C4, 0x00C5,
        ],
        [
            0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9, 0x00FF, 0x00D6,
            0x00DC, 0x00A2, 0x00A3, 0x00A5, 0x20A7, 0x0192,
        ],
        [
            0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA, 0x00BF, 0x2310,
            0x00AC, 0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
        ],
        BOX_B0,
        BOX_C0,
        BOX_D0,
        [
            0x03B1, 0x00DF, 0x0393, 0x03C0, 0x03A3, 0x03C3, 0x00B5, 0x03C4, 0x03A6, 0x0398,
            0x03A9, 0x03B4, 0x221E, 0x03C6, 0x03B5, 0x2229,
        ],
        [
            0x2261, 0x00B1, 0x2265, 0x2264, 0x2320, 0x2321, 0x00F7, 0x2248, 0x00B0, 0x2219,
            0x00B7, 0x221A, 0x207F, 0x00B2, 0x25A0, 0x00A0,
        ],
    ]),
};

const CP850_ROWS: [[u16; 16]; 8] = [
    [
        0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7, 0x00EA, 0x00EB, 0x00E8,
        0x00EF, 0x00EE, 0x00EC, 0x00C4, 0x00C5,
    ],
    [
        0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9, 0x00FF, 0x00D6, 0x00DC,
        0x00F8, 0x00A3, 0x00D8, 0x00D7, 0x0192,
    ],
    [
        0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA, 0x00BF, 0x00AE, 0x00AC,
        0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    ],
    [
        0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x00C1, 0x00C2, 0x00C0, 0x00A9, 0x2563, 0x2551,
        0x2557, 0x255D, 0x00A2, 0x00A5, 0x2510,
    ],
    [
        0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x00E3, 0x00C3, 0x255A, 0x2554, 0x2569,
        0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    ],
    [
        0x00F0, 0x00D0, 0x00CA, 0x00CB, 0x00C8, 0x0131, 0x00CD, 0x00CE, 0x00CF, 0x2518, 0x250C,
        0x2588, 0x2584, 0x00A6, 0x00CC, 0x2580,
    ],
    [
        0x00D3, 0x00DF, 0x00D4, 0x00D2, 0x00F5, 0x00D5, 0x00B5, 0x00FE, 0x00DE, 0x00DA, 0x00DB,
        0x00D9, 0x00FD, 0x00DD, 0x00AF, 0x00B4,
    ],
    [
        0x00AD, 0x00B1, 0x2017, 0x00BE, 0x00B6, 0x00A7, 0x00F7, 0x00B8, 0x00B0, 0x00A8, 0x00B7,
        0x00B9, 0x00B3, 0x00B2, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP850: OemTable = OemTable {
    code_page: 850,
    name: "ibm850",
    high: assemble(CP850_ROWS),
};

/// 858 is 850 with the euro sign in place of the dotless i at 0xD5.
pub(crate) static CP858: OemTable = OemTable {
    code_page: 858,
    name: "ibm00858",
    high: {
        let mut high = assemble(CP850_ROWS);
        high[0xD5 - 0x80] = 0x20AC;
        high
    },
};

pub(crate) static CP720: OemTable = OemTable {
    code_page: 720,
    name: "dos-720",
    high: assemble([
        [
            0x0000, 0x0000, 0x00E9, 0x00E2, 0x0000, 0x00E0, 0x0000, 0x00E7, 0x00EA, 0x00EB,
            0x00E8, 0x00EF, 0x00EE, 0x0000, 0x0000, 0x0000,
        ],
        [
            0x0000, 0x0651, 0x0652, 0x00F4, 0x00A4, 0x0640, 0x00FB, 0x00F9, 0x0621, 0x0622,
            0x0623, 0x0624, 0x00A3, 0x0625, 0x0626, 0x0627,
        ],
        [
            0x0628, 0x0629, 0x062A, 0x062B, 0x062C, 0x062D, 0x062E, 0x062F, 0x0630, 0x0631,
            0x0632, 0x0633, 0x0634, 0x0635, 0x00AB, 0x00BB,
        ],
        BOX_B0,
        BOX_C0,
        BOX_D0,
        [
            0x0636, 0x0637, 0x0638, 0x0639, 0x063A, 0x0641, 0x00B5, 0x0642, 0x0643, 0x0644,
            0x0645, 0x0646, 0x0647, 0x0648, 0x0649, 0x064A,
        ],
        [
            0x2261, 0x064B, 0x064C, 0x064D, 0x064E, 0x064F, 0x0650, 0x2248, 0x00B0, 0x2219,
            0x00B7, 0x221A, 0x207F, 0x00B2, 0x25A0, 0x00A0,
        ],
    ]),
};

const CP737_ROWS: [[u16; 16]; 8] = [
    [
        0x0391, 0x0392, 0x0393, 0x0394, 0x0395, 0x0396, 0x0397, 0x0398, 0x0399, 0x039A, 0x039B,
        0x039C, 0x039D, 0x039E, 0x039F, 0x03A0,
    ],
    [
        0x03A1, 0x03A3, 0x03A4, 0x03A5, 0x03A6, 0x03A7, 0x03A8, 0x03A9, 0x03B1, 0x03B2, 0x03B3,
        0x03B4, 0x03B5, 0x03B6, 0x03B7, 0x03B8,
    ],
    [
        0x03B9, 0x03BA, 0x03BB, 0x03BC, 0x03BD, 0x03BE, 0x03BF, 0x03C0, 0x03C1, 0x03C3, 0x03C2,
        0x03C4, 0x03C5, 0x03C6, 0x03C7, 0x03C8,
    ],
    BOX_B0,
    BOX_C0,
    BOX_D0,
    [
        0x03C9, 0x03AC, 0x03AD, 0x03AE, 0x03CA, 0x03AF, 0x03CC, 0x03CD, 0x03CB, 0x03CE, 0x0386,
        0x0388, 0x0389, 0x038A, 0x038C, 0x038E,
    ],
    [
        0x038F, 0x00B1, 0x2265, 0x2264, 0x03AA, 0x03AB, 0x00F7, 0x2248, 0x00B0, 0x2219, 0x00B7,
        0x221A, 0x207F, 0x00B2, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP737: OemTable = OemTable {
    code_page: 737,
    name: "ibm737",
    high: assemble(CP737_ROWS),
};

const CP775_ROWS: [[u16; 16]; 8] = [
    [
        0x0106, 0x00FC, 0x00E9, 0x0101, 0x00E4, 0x0123, 0x00E5, 0x0107, 0x0142, 0x0113, 0x0156,
        0x0157, 0x012B, 0x0179, 0x00C4, 0x00C5,
    ],
    [
        0x00C9, 0x00E6, 0x00C6, 0x014D, 0x00F6, 0x0122, 0x00A2, 0x015A, 0x015B, 0x00D6, 0x00DC,
        0x00F8, 0x00A3, 0x00D8, 0x00D7, 0x00A4,
    ],
    [
        0x0100, 0x012A, 0x00F3, 0x017B, 0x017C, 0x017A, 0x201D, 0x00A6, 0x00A9, 0x00AE, 0x00AC,
        0x00BD, 0x00BC, 0x0141, 0x00AB, 0x00BB,
    ],
    [
        0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x0104, 0x010C, 0x0118, 0x0116, 0x2563, 0x2551,
        0x2557, 0x255D, 0x012E, 0x0160, 0x2510,
    ],
    [
        0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x0172, 0x016A, 0x255A, 0x2554, 0x2569,
        0x2566, 0x2560, 0x2550, 0x256C, 0x017D,
    ],
    [
        0x0105, 0x010D, 0x0119, 0x0117, 0x012F, 0x0161, 0x0173, 0x016B, 0x017E, 0x2518, 0x250C,
        0x2588, 0x2584, 0x258C, 0x2590, 0x2580,
    ],
    [
        0x00D3, 0x00DF, 0x014C, 0x0143, 0x00F5, 0x00D5, 0x00B5, 0x0144, 0x0136, 0x0137, 0x013B,
        0x013C, 0x0146, 0x0112, 0x0145, 0x2019,
    ],
    [
        0x00AD, 0x00B1, 0x201C, 0x00BE, 0x00B6, 0x00A7, 0x00F7, 0x201E, 0x00B0, 0x2219, 0x00B7,
        0x00B9, 0x00B3, 0x00B2, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP775: OemTable = OemTable {
    code_page: 775,
    name: "ibm775",
    high: assemble(CP775_ROWS),
};

const CP852_ROWS: [[u16; 16]; 8] = [
    [
        0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x016F, 0x0107, 0x00E7, 0x0142, 0x00EB, 0x0150,
        0x0151, 0x00EE, 0x0179, 0x00C4, 0x0106,
    ],
    [
        0x00C9, 0x0139, 0x013A, 0x00F4, 0x00F6, 0x013D, 0x013E, 0x015A, 0x015B, 0x00D6, 0x00DC,
        0x0164, 0x0165, 0x0141, 0x00D7, 0x010D,
    ],
    [
        0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x0104, 0x0105, 0x017D, 0x017E, 0x0118, 0x0119, 0x00AC,
        0x017A, 0x010C, 0x015F, 0x00AB, 0x00BB,
    ],
    [
        0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x00C1, 0x00C2, 0x011A, 0x015E, 0x2563, 0x2551,
        0x2557, 0x255D, 0x017B, 0x017C, 0x2510,
    ],
    [
        0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x0102, 0x0103, 0x255A, 0x2554, 0x2569,
        0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    ],
    [
        0x0111, 0x0110, 0x010E, 0x00CB, 0x010F, 0x0147, 0x00CD, 0x00CE, 0x011B, 0x2518, 0x250C,
        0x2588, 0x2584, 0x0162, 0x016E, 0x2580,
    ],
    [
        0x00D3, 0x00DF, 0x00D4, 0x0143, 0x0144, 0x0148, 0x0160, 0x0161, 0x0154, 0x00DA, 0x0155,
        0x0170, 0x00FD, 0x00DD, 0x0163, 0x00B4,
    ],
    [
        0x00AD, 0x02DD, 0x02DB, 0x02C7, 0x02D8, 0x00A7, 0x00F7, 0x00B8, 0x00B0, 0x00A8, 0x02D9,
        0x0171, 0x0158, 0x0159, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP852: OemTable = OemTable {
    code_page: 852,
    name: "ibm852",
    high: assemble(CP852_ROWS),
};

const CP855_ROWS: [[u16; 16]; 8] = [
    [
        0x0452, 0x0402, 0x0453, 0x0403, 0x0451, 0x0401, 0x0454, 0x0404, 0x0455, 0x0405, 0x0456,
        0x0406, 0x0457, 0x0407, 0x0458, 0x0408,
    ],
    [
        0x0459, 0x0409, 0x045A, 0x040A, 0x045B, 0x040B, 0x045C, 0x040C, 0x045E, 0x040E, 0x045F,
        0x040F, 0x044E, 0x042E, 0x044A, 0x042A,
    ],
    [
        0x0430, 0x0410, 0x0431, 0x0411, 0x0446, 0x0426, 0x0434, 0x0414, 0x0435, 0x0415, 0x0444,
        0x0424, 0x0433, 0x0413, 0x00AB, 0x00BB,
    ],
    [
        0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x0445, 0x0425, 0x0438, 0x0418, 0x2563, 0x2551,
        0x2557, 0x255D, 0x0439, 0x0419, 0x2510,
    ],
    [
        0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x043A, 0x041A, 0x255A, 0x2554, 0x2569,
        0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    ],
    [
        0x043B, 0x041B, 0x043C, 0x041C, 0x043D, 0x041D, 0x043E, 0x041E, 0x043F, 0x2518, 0x250C,
        0x2588, 0x2584, 0x041F, 0x044F, 0x2580,
    ],
    [
        0x042F, 0x0440, 0x0420, 0x0441, 0x0421, 0x0442, 0x0422, 0x0443, 0x0423, 0x0436, 0x0416,
        0x0432, 0x0412, 0x044C, 0x042C, 0x2116,
    ],
    [
        0x00AD, 0x044B, 0x042B, 0x0437, 0x0417, 0x0448, 0x0428, 0x044D, 0x042D, 0x0449, 0x0429,
        0x0447, 0x0427, 0x00A7, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP855: OemTable = OemTable {
    code_page: 855,
    name: "ibm855",
    high: assemble(CP855_ROWS),
};

const CP857_ROWS: [[u16; 16]; 8] = [
    [
        0x00C7, 0x00FC, 0x00E9, 0x00E2, 0x00E4, 0x00E0, 0x00E5, 0x00E7, 0x00EA, 0x00EB, 0x00E8,
        0x00EF, 0x00EE, 0x0131, 0x00C4, 0x00C5,
    ],
    [
        0x00C9, 0x00E6, 0x00C6, 0x00F4, 0x00F6, 0x00F2, 0x00FB, 0x00F9, 0x0130, 0x00D6, 0x00DC,
        0x00F8, 0x00A3, 0x00D8, 0x015E, 0x015F,
    ],
    [
        0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x011E, 0x011F, 0x00BF, 0x00AE, 0x00AC,
        0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    ],
    [
        0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x00C1, 0x00C2, 0x00C0, 0x00A9, 0x2563, 0x2551,
        0x2557, 0x255D, 0x00A2, 0x00A5, 0x2510,
    ],
    [
        0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x00E3, 0x00C3, 0x255A, 0x2554, 0x2569,
        0x2566, 0x2560, 0x2550, 0x256C, 0x00A4,
    ],
    [
        0x00BA, 0x00AA, 0x00CA, 0x00CB, 0x00C8, 0x0000, 0x00CD, 0x00CE, 0x00CF, 0x2518, 0x250C,
        0x2588, 0x2584, 0x00A6, 0x00CC, 0x2580,
    ],
    [
        0x00D3, 0x00DF, 0x00D4, 0x00D2, 0x00F5, 0x00D5, 0x00B5, 0x0000, 0x00D7, 0x00DA, 0x00DB,
        0x00D9, 0x00EC, 0x00FF, 0x00AF, 0x00B4,
    ],
    [
        0x00AD, 0x00B1, 0x0000, 0x00BE, 0x00B6, 0x00A7, 0x00F7, 0x00B8, 0x00B0, 0x00A8, 0x00B7,
        0x00B9, 0x00B3, 0x00B2, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP857: OemTable = OemTable {
    code_page: 857,
    name: "ibm857",
    high: assemble(CP857_ROWS),
};

const CP862_ROWS: [[u16; 16]; 8] = [
    [
        0x05D0, 0x05D1, 0x05D2, 0x05D3, 0x05D4, 0x05D5, 0x05D6, 0x05D7, 0x05D8, 0x05D9, 0x05DA,
        0x05DB, 0x05DC, 0x05DD, 0x05DE, 0x05DF,
    ],
    [
        0x05E0, 0x05E1, 0x05E2, 0x05E3, 0x05E4, 0x05E5, 0x05E6, 0x05E7, 0x05E8, 0x05E9, 0x05EA,
        0x00A2, 0x00A3, 0x00A5, 0x20A7, 0x0192,
    ],
    [
        0x00E1, 0x00ED, 0x00F3, 0x00FA, 0x00F1, 0x00D1, 0x00AA, 0x00BA, 0x00BF, 0x2310, 0x00AC,
        0x00BD, 0x00BC, 0x00A1, 0x00AB, 0x00BB,
    ],
    BOX_B0,
    BOX_C0,
    BOX_D0,
    [
        0x03B1, 0x00DF, 0x0393, 0x03C0, 0x03A3, 0x03C3, 0x00B5, 0x03C4, 0x03A6, 0x0398, 0x03A9,
        0x03B4, 0x221E, 0x03C6, 0x03B5, 0x2229,
    ],
    [
        0x2261, 0x00B1, 0x2265, 0x2264, 0x2320, 0x2321, 0x00F7, 0x2248, 0x00B0, 0x2219, 0x00B7,
        0x221A, 0x207F, 0x00B2, 0x25A0, 0x00A0,
    ],
];

pub(crate) static CP862: OemTable = OemTable {
    code_page: 862,
    name: "dos-862",
    high: assemble(CP862_ROWS),
};

const ISO_8859_9_ROWS: [[u16; 16]; 8] = [
    [
        0x0080, 0x0081, 0x0082, 0x0083, 0x0084, 0x0085, 0x0086, 0x0087, 0x0088, 0x0089, 0x008A,
        0x008B, 0x008C, 0x008D, 0x008E, 0x008F,
    ],
    [
        0x0090, 0x0091, 0x0092, 0x0093, 0x0094, 0x0095, 0x0096, 0x0097, 0x0098, 0x0099, 0x009A,
        0x009B, 0x009C, 0x009D, 0x009E, 0x009F,
    ],
    [
        0x00A0, 0x00A1, 0x00A2, 0x00A3, 0x00A4, 0x00A5, 0x00A6, 0x00A7, 0x00A8, 0x00A9, 0x00AA,
        0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x00AF,
    ],
    [
        0x00B0, 0x00B1, 0x00B2, 0x00B3, 0x00B4, 0x00B5, 0x00B6, 0x00B7, 0x00B8, 0x00B9, 0x00BA,
        0x00BB, 0x00BC, 0x00BD, 0x00BE, 0x00BF,
    ],
    [
        0x00C0, 0x00C1, 0x00C2, 0x00C3, 0x00C4, 0x00C5, 0x00C6, 0x00C7, 0x00C8, 0x00C9, 0x00CA,
        0x00CB, 0x00CC, 0x00CD, 0x00CE, 0x00CF,
    ],
    [
        0x011E, 0x00D1, 0x00D2, 0x00D3, 0x00D4, 0x00D5, 0x00D6, 0x00D7, 0x00D8, 0x00D9, 0x00DA,
        0x00DB, 0x00DC, 0x0130, 0x015E, 0x00DF,
    ],
    [
        0x00E0, 0x00E1, 0x00E2, 0x00E3, 0x00E4, 0x00E5, 0x00E6, 0x00E7, 0x00E8, 0x00E9, 0x00EA,
        0x00EB, 0x00EC, 0x00ED, 0x00EE, 0x00EF,
    ],
    [
        0x011F, 0x00F1, 0x00F2, 0x00F3, 0x00F4, 0x00F5, 0x00F6, 0x00F7, 0x00F8, 0x00F9, 0x00FA,
        0x00FB, 0x00FC, 0x0131, 0x015F, 0x00FF,
    ],
];

pub(crate) static ISO_8859_9: OemTable = OemTable {
    code_page: 28599,
    name: "iso-8859-9",
    high: assemble(ISO_8859_9_ROWS),
};
