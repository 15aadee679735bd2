//! Built-in raw frames for a split air conditioner remote.
//!
//! Captured from the reference unit at 38kHz; `send <name>` plays them
//! without a capture first. Entry 0 is a mark, then spaces and marks
//! alternate like any stored signal.

/// A named, read-only raw frame.
#[derive(Debug)]
pub struct Preset {
    pub name: &'static str,
    pub brief: &'static str,
    pub durations: &'static [u16],
}

/// All presets, in `list` order.
pub static PRESETS: &[Preset] = &[
    Preset { name: "off", brief: "Air conditioner off", durations: &OFF },
    Preset { name: "on", brief: "Air conditioner on", durations: &ON },
    Preset { name: "temp22", brief: "Set temperature to 22C", durations: &TEMP22 },
    Preset { name: "temp20", brief: "Set temperature to 20C", durations: &TEMP20 },
    Preset { name: "fan1", brief: "Fan speed 1", durations: &FAN1 },
    Preset { name: "fan2", brief: "Fan speed 2", durations: &FAN2 },
];

/// Exact, case-insensitive lookup.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

const OFF: [u16; 227] = [
    3603, 1758, 360, 1359, 404, 1362, 405, 344, 423, 352, 426, 348,
    404, 1335, 429, 345, 427, 348, 413, 1338, 404, 1361, 404, 345,
    427, 1312, 429, 345, 426, 348, 421, 1319, 428, 1335, 362, 426,
    406, 1334, 403, 1333, 405, 345, 427, 347, 408, 1358, 403, 344,
    407, 368, 390, 1361, 403, 373, 426, 349, 403, 372, 410, 364,
    426, 349, 427, 347, 427, 348, 391, 423, 406, 345, 425, 349,
    426, 348, 426, 349, 404, 370, 403, 372, 411, 364, 413, 401,
    406, 343, 426, 349, 427, 348, 403, 371, 412, 1354, 403, 344,
    426, 349, 415, 399, 405, 344, 403, 372, 403, 1338, 427, 1334,
    404, 345, 404, 371, 414, 360, 416, 1336, 403, 1362, 404, 1333,
    406, 343, 413, 363, 410, 364, 402, 373, 426, 349, 415, 399,
    404, 345, 403, 372, 404, 1336, 427, 1335, 404, 1334, 404, 345,
    403, 372, 415, 399, 405, 344, 403, 372, 403, 372, 402, 372,
    402, 373, 402, 373, 402, 372, 416, 398, 405, 345, 427, 348,
    425, 350, 426, 348, 427, 348, 427, 348, 428, 347, 415, 398,
    381, 394, 381, 394, 380, 394, 380, 395, 380, 395, 378, 396,
    378, 397, 398, 391, 352, 423, 352, 422, 352, 423, 376, 399,
    379, 395, 383, 392, 383, 392, 399, 367, 405, 370, 404, 1331,
    402, 1336, 401, 376, 401, 373, 401, 374, 399, 1337, 414,
];

const ON: [u16; 227] = [
    3585, 1762, 354, 1393, 411, 1328, 413, 342, 392, 383, 364, 411,
    388, 1369, 409, 346, 365, 410, 445, 1326, 414, 1324, 412, 344,
    389, 1368, 408, 347, 366, 409, 365, 1393, 408, 1329, 386, 384,
    364, 1393, 410, 1329, 409, 346, 364, 411, 364, 1392, 386, 370,
    365, 410, 444, 1327, 410, 346, 363, 412, 363, 412, 363, 411,
    364, 410, 364, 411, 364, 411, 442, 347, 364, 410, 365, 410,
    363, 411, 391, 384, 364, 411, 365, 410, 363, 411, 447, 342,
    365, 410, 364, 1392, 409, 348, 364, 410, 390, 1366, 410, 347,
    391, 384, 444, 1326, 411, 1327, 412, 344, 395, 380, 395, 1361,
    410, 347, 394, 381, 395, 379, 446, 1324, 384, 1353, 391, 367,
    399, 1356, 411, 347, 398, 377, 400, 374, 401, 374, 444, 344,
    402, 1353, 414, 344, 403, 372, 403, 372, 429, 1325, 415, 345,
    429, 349, 439, 362, 413, 361, 416, 368, 403, 372, 380, 394,
    379, 396, 378, 397, 376, 399, 390, 377, 402, 369, 401, 398,
    378, 374, 400, 374, 399, 375, 399, 375, 396, 380, 407, 381,
    390, 384, 366, 409, 364, 411, 365, 409, 366, 409, 386, 388,
    389, 386, 378, 411, 364, 411, 363, 412, 362, 412, 363, 412,
    364, 410, 364, 411, 363, 412, 375, 1396, 343, 413, 360, 414,
    361, 1396, 343, 1396, 342, 1396, 340, 1398, 340, 416, 368,
];

const TEMP22: [u16; 227] = [
    3609, 1760, 381, 1338, 403, 1363, 404, 344, 404, 371, 403, 372,
    404, 1336, 427, 345, 403, 372, 415, 1335, 404, 1362, 405, 344,
    404, 1360, 404, 344, 404, 371, 403, 1362, 403, 1334, 389, 399,
    405, 1313, 425, 1334, 405, 344, 403, 372, 403, 1361, 404, 344,
    403, 372, 419, 1334, 428, 346, 402, 372, 403, 372, 403, 372,
    403, 372, 402, 372, 403, 372, 419, 372, 427, 345, 403, 372,
    402, 372, 403, 372, 403, 372, 402, 372, 403, 373, 419, 370,
    428, 345, 404, 1361, 404, 344, 403, 372, 423, 1341, 404, 346,
    428, 318, 444, 1338, 428, 1334, 403, 370, 381, 394, 380, 1333,
    405, 1333, 403, 397, 354, 421, 361, 1365, 400, 400, 353, 422,
    377, 1336, 399, 401, 382, 393, 381, 394, 383, 392, 393, 371,
    405, 1331, 404, 373, 403, 372, 402, 1333, 403, 374, 400, 375,
    398, 376, 410, 379, 396, 378, 394, 381, 392, 383, 389, 385,
    391, 384, 391, 384, 392, 382, 379, 410, 390, 385, 364, 411,
    363, 411, 363, 412, 365, 410, 389, 386, 362, 413, 375, 414,
    360, 414, 362, 414, 361, 414, 359, 416, 358, 435, 340, 435,
    340, 438, 350, 436, 338, 437, 337, 437, 337, 438, 337, 438,
    336, 439, 335, 440, 335, 482, 306, 1404, 333, 1406, 331, 1432,
    306, 445, 329, 470, 305, 445, 330, 469, 305, 1444, 303,
];

const TEMP20: [u16; 227] = [
    3611, 1759, 364, 1356, 428, 1314, 428, 344, 427, 317, 461, 300,
    474, 1308, 430, 345, 427, 349, 421, 1327, 405, 1339, 428, 344,
    412, 1326, 428, 346, 427, 348, 427, 1311, 430, 1312, 386, 424,
    406, 1308, 429, 1311, 428, 344, 403, 371, 427, 1312, 429, 345,
    410, 364, 417, 1334, 404, 373, 422, 352, 427, 348, 428, 347,
    426, 349, 427, 347, 427, 348, 392, 422, 405, 345, 428, 346,
    428, 346, 427, 348, 427, 349, 426, 347, 410, 365, 417, 397,
    406, 344, 428, 1311, 429, 344, 403, 372, 427, 1311, 429, 345,
    403, 373, 415, 1336, 429, 1336, 403, 345, 404, 372, 404, 1337,
    426, 1334, 404, 346, 404, 396, 399, 1325, 429, 1311, 429, 371,
    377, 1335, 405, 395, 353, 422, 351, 423, 352, 424, 400, 388,
    383, 1329, 400, 401, 385, 389, 386, 1326, 402, 400, 385, 389,
    409, 345, 446, 341, 403, 370, 406, 370, 404, 369, 404, 371,
    402, 373, 401, 373, 401, 373, 443, 349, 396, 376, 395, 380,
    393, 382, 390, 384, 391, 384, 392, 383, 392, 383, 379, 430,
    370, 384, 364, 410, 362, 413, 363, 412, 367, 408, 389, 386,
    361, 414, 378, 430, 342, 433, 342, 415, 360, 433, 340, 434,
    340, 435, 339, 435, 340, 438, 350, 1399, 338, 438, 337, 437,
    337, 1401, 337, 439, 335, 440, 335, 440, 334, 1439, 307,
];

const FAN1: [u16; 227] = [
    3610, 1735, 437, 1310, 427, 1336, 404, 345, 402, 372, 404, 371,
    402, 1363, 403, 345, 402, 373, 443, 1335, 404, 1333, 404, 346,
    402, 1361, 405, 344, 403, 372, 403, 1360, 405, 1334, 391, 372,
    402, 1361, 405, 1332, 406, 345, 402, 372, 402, 1359, 407, 345,
    402, 373, 443, 1331, 407, 346, 402, 372, 402, 373, 401, 373,
    402, 373, 402, 373, 402, 373, 442, 347, 401, 373, 401, 373,
    402, 374, 400, 374, 402, 373, 400, 374, 401, 374, 443, 346,
    400, 375, 401, 1356, 410, 345, 402, 373, 401, 1357, 382, 373,
    400, 374, 443, 1329, 383, 1355, 384, 371, 401, 374, 400, 1357,
    384, 1354, 409, 347, 400, 374, 441, 1331, 409, 1329, 409, 346,
    401, 1357, 408, 347, 401, 374, 401, 374, 400, 374, 443, 1329,
    382, 373, 400, 1357, 408, 347, 402, 1357, 408, 347, 401, 373,
    401, 373, 443, 347, 401, 373, 402, 373, 401, 374, 401, 373,
    402, 373, 401, 374, 401, 373, 443, 346, 402, 373, 401, 373,
    403, 372, 402, 372, 402, 373, 402, 373, 402, 372, 443, 346,
    402, 373, 402, 372, 402, 373, 402, 373, 402, 372, 403, 372,
    403, 372, 443, 346, 401, 373, 402, 373, 402, 372, 406, 371,
    427, 349, 427, 346, 428, 371, 389, 399, 405, 370, 381, 1332,
    405, 1333, 404, 396, 378, 397, 375, 399, 374, 1339, 385,
];

const FAN2: [u16; 229] = [
    278, 134, 3609, 1760, 411, 1335, 405, 1332, 406, 345, 402, 372,
    402, 373, 403, 1359, 406, 345, 402, 373, 443, 1332, 406, 1332,
    407, 344, 403, 1359, 406, 345, 402, 373, 402, 1358, 408, 1329,
    395, 373, 402, 1357, 408, 1330, 408, 345, 403, 372, 402, 1357,
    409, 345, 402, 373, 442, 1330, 409, 345, 402, 373, 402, 373,
    402, 372, 402, 373, 402, 373, 402, 373, 442, 346, 402, 373,
    402, 372, 403, 372, 403, 371, 403, 372, 403, 372, 402, 373,
    443, 345, 402, 373, 402, 373, 402, 372, 403, 372, 403, 1353,
    410, 346, 403, 373, 443, 1326, 411, 1326, 412, 346, 403, 372,
    403, 1352, 411, 1327, 412, 346, 403, 370, 445, 1326, 411, 1328,
    411, 350, 426, 1327, 410, 371, 404, 370, 404, 370, 382, 393,
    390, 1357, 384, 396, 378, 1355, 380, 400, 375, 1358, 383, 396,
    378, 375, 400, 373, 416, 373, 402, 373, 400, 375, 398, 376,
    397, 377, 395, 381, 392, 382, 391, 383, 410, 379, 366, 409,
    365, 409, 390, 385, 391, 384, 390, 385, 389, 385, 388, 387,
    378, 411, 363, 411, 363, 412, 364, 413, 386, 386, 388, 387,
    362, 413, 360, 415, 377, 411, 362, 413, 362, 413, 361, 414,
    360, 416, 358, 417, 358, 435, 340, 438, 350, 436, 338, 437,
    337, 438, 337, 1400, 338, 437, 337, 438, 336, 439, 335, 1438,
    309,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset() {
        assert_eq!(find_preset("off").map(|p| p.durations.len()), Some(227));
        assert_eq!(find_preset("TEMP22").map(|p| p.name), Some("temp22"));
        assert!(find_preset("1").is_none());
    }

    #[test]
    fn test_presets_are_playable() {
        for p in PRESETS {
            assert!(!p.durations.is_empty(), "{}", p.name);
            assert!(p.durations.iter().all(|&d| d > 0), "{}", p.name);
            assert!(p.durations.len() <= crate::config::MAX_TRANSITIONS, "{}", p.name);
        }
    }

    #[test]
    fn test_frames_start_with_leader() {
        for name in ["off", "on", "temp22", "temp20", "fan1"] {
            let frame = find_preset(name).map(|p| p.durations).unwrap_or(&[]);
            assert!(frame[0] > 3_500 && frame[1] > 1_700, "{}", name);
        }
    }
}
