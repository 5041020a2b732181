use qrcode::render::svg;
use qrcode::QrCode;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Builds the signup link a referral QR code points at, e.g.
/// `https://host/register?ref=ABCD2345`.
pub fn referral_link(base_url: &str, referral_code: &str) -> Result<Url, QrGenerationError> {
    let mut url = Url::parse(base_url)?.join("register")?;
    url.query_pairs_mut().append_pair("ref", referral_code);
    Ok(url)
}

/// Renders a referral signup link as an SVG QR code.
pub fn generate_referral_qr_svg(
    base_url: &str,
    referral_code: &str,
) -> Result<String, QrGenerationError> {
    let link = referral_link(base_url, referral_code)?;

    let code = QrCode::new(link.as_str().as_bytes())?;
    let svg = code.render::<svg::Color>().min_dimensions(200, 200).build();

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_link_shape() {
        let link = referral_link("https://earn.example/", "ABCD2345").unwrap();
        assert_eq!(link.as_str(), "https://earn.example/register?ref=ABCD2345");
    }

    #[test]
    fn test_qr_svg_generation() {
        let svg = generate_referral_qr_svg("https://earn.example/", "ABCD2345").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            generate_referral_qr_svg("not a url", "X"),
            Err(QrGenerationError::InvalidBaseUrl(_))
        ));
    }
}
