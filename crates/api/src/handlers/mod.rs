pub mod trigger_form;
