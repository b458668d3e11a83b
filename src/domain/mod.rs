pub mod county;
pub mod permit;
pub mod portal_page;
