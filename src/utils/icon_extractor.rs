//! Icon extraction from executables
//!
//! On Windows the icon embedded in an executable is read through Shell32
//! (`ExtractIconExW`, falling back to `SHGetFileInfoW`) and converted to
//! 32x32 RGBA. Other platforms report `IconLoadError::Unsupported`, which the
//! icon cache turns into the generic application icon.

use crate::error::IconLoadError;
use image::imageops::FilterType;
use std::path::Path;

#[cfg(windows)]
use tracing::{debug, warn};

#[cfg(windows)]
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, CreateCompatibleDC, DIB_RGB_COLORS, DeleteDC,
    DeleteObject, GetDIBits, GetObjectW, SelectObject,
};
#[cfg(windows)]
use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    ExtractIconExW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGetFileInfoW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{DestroyIcon, GetIconInfo, HICON, ICONINFO};
#[cfg(windows)]
use windows::core::PCWSTR;

/// Edge length of every icon handed out by the cache
pub const ICON_SIZE: u32 = 32;

/// Byte length of a normalized RGBA icon
pub const ICON_BYTES: usize = (ICON_SIZE * ICON_SIZE * 4) as usize;

/// Extract the icon embedded in an executable as 32x32 RGBA
pub fn extract_icon_from_exe(path: &Path) -> Result<Vec<u8>, IconLoadError> {
    #[cfg(windows)]
    {
        extract_icon_windows(path)
    }

    #[cfg(not(windows))]
    {
        let _ = path;
        Err(IconLoadError::Unsupported)
    }
}

/// Default display name for an executable: its file name without extension
pub fn display_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
}

/// Built-in generic application icon (32x32 RGBA)
///
/// A light window with a dark frame and a title bar.
pub fn generic_application_icon() -> Vec<u8> {
    let size = ICON_SIZE as usize;
    let mut icon = vec![0u8; ICON_BYTES];

    for y in 2..size - 2 {
        for x in 2..size - 2 {
            let idx = (y * size + x) * 4;
            let frame = x == 2 || x == size - 3 || y == 2 || y == size - 3;
            let title_bar = y < 9;
            let shade = if frame {
                64
            } else if title_bar {
                90
            } else {
                220
            };
            icon[idx] = shade;
            icon[idx + 1] = shade;
            icon[idx + 2] = if title_bar && !frame { 160 } else { shade };
            icon[idx + 3] = 255;
        }
    }

    icon
}

/// Resize arbitrary RGBA pixels to the standard icon size
///
/// Uses Lanczos3 resampling; returns `None` if `rgba` does not match the dimensions.
pub fn normalize_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Option<Vec<u8>> {
    if width == ICON_SIZE && height == ICON_SIZE {
        return (rgba.len() == ICON_BYTES).then_some(rgba);
    }
    let image = image::RgbaImage::from_raw(width, height, rgba)?;
    Some(image::imageops::resize(&image, ICON_SIZE, ICON_SIZE, FilterType::Lanczos3).into_raw())
}

/// Windows-specific icon extraction implementation
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for ExtractIconExW and icon handle cleanup"
)]
fn extract_icon_windows(path: &Path) -> Result<Vec<u8>, IconLoadError> {
    use std::os::windows::ffi::OsStrExt;

    let wide_path: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    debug!("Extracting icon from: {:?}", path);

    let mut large_icon = HICON::default();
    // SAFETY: wide_path is NUL-terminated and outlives the call; large_icon is a
    // valid out-pointer for exactly one icon.
    let extracted = unsafe {
        ExtractIconExW(
            PCWSTR(wide_path.as_ptr()),
            0,
            Some(&raw mut large_icon),
            None,
            1,
        )
    };

    if extracted == 0 || large_icon.is_invalid() {
        warn!("ExtractIconExW found no icon in {:?}, trying SHGetFileInfoW", path);
        return extract_icon_using_shgetfileinfo(path, &wide_path);
    }

    let result = hicon_to_rgba(path, large_icon);
    // SAFETY: large_icon was returned by ExtractIconExW and is destroyed once.
    unsafe {
        let _ = DestroyIcon(large_icon);
    }
    result
}

/// Fallback icon extraction using `SHGetFileInfoW` (shell-associated icon)
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for SHGetFileInfoW and icon handle cleanup"
)]
fn extract_icon_using_shgetfileinfo(
    path: &Path,
    wide_path: &[u16],
) -> Result<Vec<u8>, IconLoadError> {
    // SAFETY: SHFILEINFOW is plain data; zeroed is its documented initial state.
    let mut file_info: SHFILEINFOW = unsafe { std::mem::zeroed() };

    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<SHFILEINFOW>() is a compile-time constant that fits in u32"
    )]
    // SAFETY: wide_path is NUL-terminated; file_info is a valid out-parameter of the given size.
    let result = unsafe {
        SHGetFileInfoW(
            PCWSTR(wide_path.as_ptr()),
            FILE_FLAGS_AND_ATTRIBUTES(0),
            Some(&raw mut file_info),
            std::mem::size_of::<SHFILEINFOW>() as u32,
            SHGFI_ICON | SHGFI_LARGEICON,
        )
    };

    if result == 0 || file_info.hIcon.is_invalid() {
        return Err(IconLoadError::Extraction {
            path: path.to_path_buf(),
            reason: "no icon resource and no shell icon".to_string(),
        });
    }

    let icon = hicon_to_rgba(path, file_info.hIcon);
    // SAFETY: hIcon was created by SHGetFileInfoW with SHGFI_ICON and is owned by us.
    unsafe {
        let _ = DestroyIcon(file_info.hIcon);
    }
    icon
}

/// Convert an HICON to normalized RGBA bytes
///
/// Reads the color bitmap through a compatible DC as a top-down 32-bit DIB,
/// swaps BGRA to RGBA, then resizes to `ICON_SIZE`.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows GDI FFI to read icon bitmaps"
)]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    reason = "GDI dimensions are small positive values and BITMAP sizes are compile-time constants"
)]
fn hicon_to_rgba(path: &Path, hicon: HICON) -> Result<Vec<u8>, IconLoadError> {
    let gdi_failure = |what: &str| IconLoadError::Extraction {
        path: path.to_path_buf(),
        reason: format!("{what}: {}", windows::core::Error::from_thread()),
    };

    // SAFETY: every handle obtained below is checked before use and released
    // on all paths; buffers are sized from the queried bitmap dimensions.
    unsafe {
        let mut icon_info: ICONINFO = std::mem::zeroed();
        if GetIconInfo(hicon, &raw mut icon_info).is_err() {
            return Err(gdi_failure("GetIconInfo failed"));
        }

        let color_bitmap = icon_info.hbmColor;
        let mask_bitmap = icon_info.hbmMask;
        let release_bitmaps = || {
            let _ = DeleteObject(color_bitmap.into());
            let _ = DeleteObject(mask_bitmap.into());
        };

        let mut bitmap: BITMAP = std::mem::zeroed();
        if GetObjectW(
            color_bitmap.into(),
            std::mem::size_of::<BITMAP>() as i32,
            Some((&raw mut bitmap).cast()),
        ) == 0
        {
            release_bitmaps();
            return Err(gdi_failure("GetObjectW failed"));
        }

        let width = bitmap.bmWidth as u32;
        let height = bitmap.bmHeight as u32;

        let hdc = CreateCompatibleDC(None);
        if hdc.is_invalid() {
            release_bitmaps();
            return Err(gdi_failure("CreateCompatibleDC failed"));
        }
        let old_bitmap = SelectObject(hdc, color_bitmap.into());

        let mut bmi: BITMAPINFO = std::mem::zeroed();
        bmi.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
        bmi.bmiHeader.biWidth = width as i32;
        bmi.bmiHeader.biHeight = -(height as i32); // Negative for top-down DIB
        bmi.bmiHeader.biPlanes = 1;
        bmi.bmiHeader.biBitCount = 32;
        bmi.bmiHeader.biCompression = BI_RGB.0;

        let mut buffer = vec![0u8; (width * height * 4) as usize];
        let lines = GetDIBits(
            hdc,
            color_bitmap,
            0,
            height,
            Some(buffer.as_mut_ptr().cast()),
            &raw mut bmi,
            DIB_RGB_COLORS,
        );

        let _ = SelectObject(hdc, old_bitmap);
        let _ = DeleteDC(hdc);
        release_bitmaps();

        if lines == 0 {
            return Err(gdi_failure("GetDIBits failed"));
        }

        for pixel in buffer.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }

        normalize_rgba(buffer, width, height).ok_or_else(|| IconLoadError::Extraction {
            path: path.to_path_buf(),
            reason: format!("unexpected bitmap layout {width}x{height}"),
        })
    }
}
