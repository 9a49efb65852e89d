use super::RenderConfig;

/// Glyph and status bar layout constants.
pub(crate) const FONT_WIDTH: usize = 5;
pub(crate) const FONT_HEIGHT: usize = 7;
pub(crate) const STATUS_PAD_TOP: usize = 3;
pub(crate) const STATUS_PAD_BOTTOM: usize = 2;
pub(crate) const STATUS_BAR_HEIGHT: usize = STATUS_PAD_TOP + FONT_HEIGHT + STATUS_PAD_BOTTOM;

/// 5x7 bitmap font glyph lookup. Each row is a u8 with lower 5 bits = pixels (bit4=left).
pub(crate) const fn glyph(ch: u8) -> [u8; FONT_HEIGHT] {
    match ch {
        b' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        b'.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00],
        b'-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        b'/' => [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10],
        b'>' => [0x10, 0x08, 0x04, 0x02, 0x04, 0x08, 0x10],
        b'=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        b'[' => [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E],
        b']' => [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E],
        b'|' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        b':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        b',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        b'+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        b'(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        b')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        b'_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        b'0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        b'1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        b'3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        b'4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        b'5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        b'6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        b'7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        b'8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        b'9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        b'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        b'b' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E],
        b'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E],
        b'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        b'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        b'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        b'g' => [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x0E],
        b'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        b'j' => [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C],
        b'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        b'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11],
        b'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        b'p' => [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10],
        b'q' => [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01],
        b'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        b's' => [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E],
        b't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        b'u' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D],
        b'v' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04],
        b'w' => [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A],
        b'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        b'y' => [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        b'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F],
        _ => [0x00; FONT_HEIGHT],
    }
}

/// Blit one glyph scaled to `cw` x `ch` pixels (nearest neighbor).
/// At `FONT_WIDTH` x `FONT_HEIGHT` this is a straight copy of the bitmap.
fn blit_glyph(buf: &mut [u8], frame_width: usize, x: usize, y: usize, code: u8, color: [u8; 3], cw: usize, ch: usize) {
    let rows = glyph(code);
    for py in 0..ch {
        let bits = rows[py * FONT_HEIGHT / ch];
        if bits == 0 {
            continue;
        }
        for px in 0..cw {
            let col = px * FONT_WIDTH / cw;
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            let off = ((y + py) * frame_width + x + px) * 4;
            if let Some(dst) = buf.get_mut(off..off + 4) {
                dst[..3].copy_from_slice(&color);
                dst[3] = 255;
            }
        }
    }
}

fn draw_run(buf: &mut [u8], frame_width: usize, x: usize, y: usize, text: &str, color: [u8; 3], cw: usize, ch: usize, step: usize) -> usize {
    text.bytes().fold(x, |cx, code| {
        blit_glyph(buf, frame_width, cx, y, code, color, cw, ch);
        cx + step
    })
}

/// Draw `text` at native size. Returns the x position after the last character.
pub(crate) fn draw_text(buf: &mut [u8], frame_width: usize, x: usize, y: usize, text: &str, color: [u8; 3]) -> usize {
    draw_run(buf, frame_width, x, y, text, color, FONT_WIDTH, FONT_HEIGHT, FONT_WIDTH + 1)
}

/// Draw `text` with each glyph scaled to `cw` x `ch`, spaced by about a fifth
/// of the glyph width. Returns the x position after the last character.
pub(crate) fn draw_text_sized(buf: &mut [u8], frame_width: usize, x: usize, y: usize, text: &str, color: [u8; 3], cw: usize, ch: usize) -> usize {
    draw_run(buf, frame_width, x, y, text, color, cw, ch, cw + cw / 5 + 1)
}

/// Fill a horizontal band of the frame with a solid color.
fn fill_rows(buf: &mut [u8], frame_width: usize, y0: usize, y1: usize, color: [u8; 3]) {
    for y in y0..y1 {
        for x in 0..frame_width {
            let offset = (y * frame_width + x) * 4;
            if offset + 3 < buf.len() {
                buf[offset..offset + 3].copy_from_slice(&color);
                buf[offset + 3] = 255;
            }
        }
    }
}

/// Draw the bottom status bar: readout on the left, key hint flush right.
/// The hint is dropped when both do not fit.
pub fn render_status(buf: &mut [u8], cfg: &RenderConfig, readout: &str, hint: &str) {
    let fw = cfg.frame_width;
    let y_start = cfg.display_height;
    let char_step = FONT_WIDTH + 1;

    fill_rows(buf, fw, y_start, cfg.frame_height, [0x0D, 0x0D, 0x0D]);
    fill_rows(buf, fw, y_start, y_start + 1, [0x33, 0x33, 0x33]);

    let text_y = y_start + STATUS_PAD_TOP;
    // Clip the readout to whole characters that fit.
    let fits = fw.saturating_sub(4 + FONT_WIDTH) / char_step + 1;
    let shown = readout.get(..readout.len().min(fits)).unwrap_or(readout);
    let cx = draw_text(buf, fw, 4, text_y, shown, [0xAA, 0xAA, 0xAA]);
    if shown.len() < readout.len() {
        return;
    }

    let hint_w = hint.len() * char_step;
    if cx + 2 * char_step + hint_w + 4 <= fw {
        draw_text(buf, fw, fw - hint_w - 4, text_y, hint, [0x44, 0x88, 0x88]);
    }
}
