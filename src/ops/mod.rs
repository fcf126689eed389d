// ============================================================================
// OPS MODULE — scene flattening and caption rasterization
// ============================================================================
//
//   compose.rs — percent-to-pixel geometry shared by preview and export,
//                plus the CPU flatten pass that produces the final image
//   caption.rs — meme-style text: wrap, layout, outline and fill raster
// ============================================================================

pub mod caption;
pub mod compose;
