/// Catalog JSON served next to the page, relative to the asset root.
pub const RELATIVE_CATALOG_PATH: &str = "images.json";

/// Base path image identifiers are resolved against.
pub const IMAGE_BASE_PATH: &str = "data";

/// Server-side metric sort endpoint.
pub const SORT_ENDPOINT: &str = "/sorted-images";

/// Snapshot-to-QR endpoint.
pub const QR_ENDPOINT: &str = "/generate-qr";

/// DOM id of the QR overlay container owned by the hosting page.
pub const QR_CONTAINER_ID: &str = "qrCodeContainer";

/// DOM id the QR image and share link are injected into.
pub const QR_CONTENT_ID: &str = "qrContent";
