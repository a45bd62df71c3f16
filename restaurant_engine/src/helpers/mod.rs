mod order_number;
mod validation;

pub use order_number::{generate_order_number, is_valid_order_number};
pub use validation::{
    slugify,
    validate_delivery_fee,
    validate_email,
    validate_menu_price,
    validate_not_blank,
    validate_phone,
    validate_preparation_time,
    validate_quantity,
    validate_rating,
    MAX_MENU_PRICE,
    MAX_QUANTITY,
    MIN_QUANTITY,
};
