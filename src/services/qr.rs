use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma, codecs::png::PngEncoder};
use qrcode::{Color, EcLevel, QrCode};

use crate::error::AppError;

/// 1モジュールあたりのピクセル数
const MODULE_PX: u32 = 8;
/// 周囲の余白（モジュール数）
const BORDER: u32 = 2;

/// テキストを QR コードの PNG（白地に黒）に変換
///
/// 誤り訂正レベル L（最大 2,953 バイト）。issuer と label が各256バイトでも
/// パーセントエンコード後の URI が収まる。
pub fn render_png(text: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
        .map_err(|e| AppError::QrRender(e.to_string()))?;

    let width = code.width() as u32;
    let colors = code.to_colors();
    let size = (width + BORDER * 2) * MODULE_PX;

    let mut img = GrayImage::from_pixel(size, size, Luma([255u8]));
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let x = (i as u32 % width + BORDER) * MODULE_PX;
        let y = (i as u32 / width + BORDER) * MODULE_PX;
        for dy in 0..MODULE_PX {
            for dx in 0..MODULE_PX {
                img.put_pixel(x + dx, y + dy, Luma([0u8]));
            }
        }
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(img.as_raw(), size, size, ExtendedColorType::L8)
        .map_err(|e| AppError::QrRender(e.to_string()))?;

    Ok(png)
}

/// QR コードを `data:image/png;base64,...` 形式で返す
pub fn data_url(text: &str) -> Result<String, AppError> {
    let png = render_png(text)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
