//! Media types for response bodies.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Aac,
    Avi,
    Binary,
    Bitmap,
    Css,
    Csv,
    Epub,
    GZip,
    Gif,
    Html,
    Http,
    Icon,
    Jpeg,
    JavaScript,
    Json,
    Mp3,
    Mp4,
    OggAudio,
    Png,
    Pdf,
    Php,
    Rtf,
    Svg,
    Swf,
    Ttf,
    Text,
    Wav,
    WebmAudio,
    WebmVideo,
    Webp,
    Woff,
    Woff2,
    Xhtml,
    Xml,
    Zip,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Aac => "audio/aac",
            MediaType::Avi => "video/x-msvideo",
            MediaType::Binary => "application/octet-stream",
            MediaType::Bitmap => "image/bmp",
            MediaType::Css => "text/css",
            MediaType::Csv => "text/csv",
            MediaType::Epub => "application/epub+zip",
            MediaType::GZip => "application/gzip",
            MediaType::Gif => "image/gif",
            MediaType::Html => "text/html",
            MediaType::Http => "message/http",
            MediaType::Icon => "image/vnd.microsoft.icon",
            MediaType::Jpeg => "image/jpeg",
            MediaType::JavaScript => "text/javascript",
            MediaType::Json => "application/json",
            MediaType::Mp3 => "audio/mpeg",
            MediaType::Mp4 => "video/mp4",
            MediaType::OggAudio => "audio/ogg",
            MediaType::Png => "image/png",
            MediaType::Pdf => "application/pdf",
            MediaType::Php => "application/php",
            MediaType::Rtf => "application/rtf",
            MediaType::Svg => "image/svg+xml",
            MediaType::Swf => "application/x-shockwave-flash",
            MediaType::Ttf => "font/ttf",
            MediaType::Text => "text/plain",
            MediaType::Wav => "audio/wav",
            MediaType::WebmAudio => "audio/webm",
            MediaType::WebmVideo => "video/webm",
            MediaType::Webp => "image/webp",
            MediaType::Woff => "font/woff",
            MediaType::Woff2 => "font/woff2",
            MediaType::Xhtml => "application/xhtml+xml",
            MediaType::Xml => "application/xml",
            MediaType::Zip => "application/zip",
        }
    }

    /// Picks a media type from a file extension (without the dot).
    /// Unknown extensions are served as `application/octet-stream`.
    ///
    /// ```
    /// # use segaline::http::mime::MediaType;
    /// assert_eq!(MediaType::from_extension("html"), MediaType::Html);
    /// assert_eq!(MediaType::from_extension("PNG"), MediaType::Png);
    /// assert_eq!(MediaType::from_extension("exe"), MediaType::Binary);
    /// ```
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "aac" => MediaType::Aac,
            "avi" => MediaType::Avi,
            "bmp" => MediaType::Bitmap,
            "css" => MediaType::Css,
            "csv" => MediaType::Csv,
            "epub" => MediaType::Epub,
            "gz" => MediaType::GZip,
            "gif" => MediaType::Gif,
            "htm" | "html" => MediaType::Html,
            "ico" => MediaType::Icon,
            "jpg" | "jpeg" => MediaType::Jpeg,
            "js" => MediaType::JavaScript,
            "json" => MediaType::Json,
            "mp3" => MediaType::Mp3,
            "mp4" => MediaType::Mp4,
            "oga" => MediaType::OggAudio,
            "png" => MediaType::Png,
            "pdf" => MediaType::Pdf,
            "php" => MediaType::Php,
            "rtf" => MediaType::Rtf,
            "svg" => MediaType::Svg,
            "swf" => MediaType::Swf,
            "ttf" => MediaType::Ttf,
            "txt" => MediaType::Text,
            "wav" => MediaType::Wav,
            "weba" => MediaType::WebmAudio,
            "webm" => MediaType::WebmVideo,
            "webp" => MediaType::Webp,
            "woff" => MediaType::Woff,
            "woff2" => MediaType::Woff2,
            "xhtml" => MediaType::Xhtml,
            "xml" => MediaType::Xml,
            "zip" => MediaType::Zip,
            _ => MediaType::Binary,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
