pub mod attn_mask;
